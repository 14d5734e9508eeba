use super::ui;
use crate::aggregator::BatchResult;
use crate::service::QuoteService;
use anyhow::Result;
use comfy_table::Cell;

pub async fn run_batch(service: &QuoteService, category: Option<&str>) -> Result<()> {
    let title = category.unwrap_or("all categories");
    let pb = ui::new_spinner(&format!("Fetching {title}"));
    let result = service.batch(category).await;
    pb.finish_and_clear();

    let result = result?;
    if result.is_empty() {
        let known: Vec<&str> = service.catalog().category_names().collect();
        println!(
            "No instruments selected for {}. Known categories: {}",
            title,
            known.join(", ")
        );
        return Ok(());
    }

    println!("\nQuotes: {}", ui::style_text(title, ui::StyleType::Title));
    println!("{}", display_as_table(&result));
    print_failed(&result);
    Ok(())
}

pub async fn run_indices(service: &QuoteService) -> Result<()> {
    let pb = ui::new_spinner("Fetching indices");
    let result = service.indices().await;
    pb.finish_and_clear();

    let result = result?;
    println!("\n{}", ui::style_text("Indices", ui::StyleType::Title));
    println!("{}", display_as_table(&result));
    print_failed(&result);
    Ok(())
}

fn display_as_table(result: &BatchResult) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Name"),
        ui::header_cell("Value"),
        ui::header_cell("Change"),
        ui::header_cell("Change (%)"),
        ui::header_cell(""),
    ]);

    for quote in &result.succeeded {
        table.add_row(vec![
            Cell::new(quote.instrument.to_string()),
            Cell::new(&quote.label),
            ui::value_cell(quote.current_value),
            ui::change_cell(quote.change, ""),
            ui::change_cell(quote.change_percent, "%"),
            ui::estimated_cell(quote.is_estimated),
        ]);
    }

    format!(
        "{table}\n{}",
        ui::style_text(
            &format!("As of {}", result.observed_at.format("%Y-%m-%d %H:%M:%S UTC")),
            ui::StyleType::Subtle
        )
    )
}

fn print_failed(result: &BatchResult) {
    if result.failed.is_empty() {
        return;
    }
    let symbols: Vec<String> = result.failed.iter().map(ToString::to_string).collect();
    println!(
        "{} {}",
        ui::style_text("Unavailable:", ui::StyleType::Error),
        symbols.join(", ")
    );
}
