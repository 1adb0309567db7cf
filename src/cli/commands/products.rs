use clap::Subcommand;
use serde_json::Value;

use crate::cli::config::resolve_server;
use crate::cli::utils::{cell, output_empty_collection, read_envelope, with_markers};
use crate::cli::{CliContext, OutputFormat};

#[derive(Subcommand)]
pub enum ProductCommands {
    #[command(about = "List products, optionally filtered")]
    List {
        #[arg(long, help = "Filter by exact barcode (scanner lookup)")]
        barcode: Option<String>,

        #[arg(long, help = "Filter by category")]
        category: Option<String>,
    },

    #[command(about = "Show one product")]
    Get {
        #[arg(help = "Product id")]
        id: String,
    },
}

pub async fn handle(cmd: ProductCommands, ctx: CliContext) -> anyhow::Result<()> {
    let server = resolve_server(ctx.server.as_deref())?;
    let client = reqwest::Client::new();

    match cmd {
        ProductCommands::List { barcode, category } => {
            let mut query: Vec<(&str, String)> = Vec::new();
            if let Some(barcode) = barcode {
                query.push(("barcode", barcode));
            }
            if let Some(category) = category {
                query.push(("category", category));
            }

            let request = client
                .get(format!("{}/api/products", server))
                .query(&query);
            let products = read_envelope(with_markers(request)?.send().await?).await?;
            let products = products.as_array().cloned().unwrap_or_default();

            if products.is_empty() {
                return output_empty_collection(&ctx.output, "products", "No products found");
            }

            match ctx.output {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&Value::Array(products))?)
                }
                OutputFormat::Text => {
                    println!(
                        "{:<30} {:<14} {:>8} {:>9} {:>6}  {}",
                        "NAME", "CATEGORY", "THC MG", "PRICE", "STOCK", "BARCODE"
                    );
                    println!("{}", "-".repeat(84));

                    for product in &products {
                        println!(
                            "{:<30} {:<14} {:>8} {:>9} {:>6}  {}",
                            cell(product, "name"),
                            cell(product, "category"),
                            cell(product, "thc_mg"),
                            cell(product, "price"),
                            cell(product, "stock_qty"),
                            cell(product, "barcode"),
                        );
                    }
                }
            }
            Ok(())
        }
        ProductCommands::Get { id } => {
            let request = client.get(format!("{}/api/products/{}", server, id));
            let product = read_envelope(with_markers(request)?.send().await?).await?;
            println!("{}", serde_json::to_string_pretty(&product)?);
            Ok(())
        }
    }
}
