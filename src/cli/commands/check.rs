//! Tool availability check.

use console::style;

use docverify::config::Config;
use docverify::ocr::{EngineChain, PopplerTools};

pub fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Extraction Tool Status").bold());
    println!("{}", "-".repeat(50));

    if let Some(path) = &config.source_path {
        println!("Config: {}", path.display());
    }

    println!("\n{}", style("PDF Tools:").cyan());
    let mut all_found = true;
    for (tool, available) in PopplerTools::check_tools() {
        let status = if available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    println!("\n{}", style("Recognition Engines:").cyan());
    let chain = EngineChain::from_settings(&config.ocr, &config.paddle);
    let mut any_engine = false;
    for (slot, backend) in ["primary", "secondary"].iter().zip(chain.backends()) {
        let status = if backend.is_available() {
            any_engine = true;
            style("✓ available").green()
        } else {
            style("✗ not available").red()
        };
        println!(
            "  {:<15} {} {}",
            backend.backend_type().as_str(),
            status,
            style(format!("({})", slot)).dim()
        );
        if !backend.is_available() {
            println!("                  {}", style(backend.availability_hint()).dim());
        }
    }

    if !config.paddle.endpoints.is_empty() {
        println!("\n{}", style("PaddleOCR Endpoints:").cyan());
        for (lang, url) in &config.paddle.endpoints {
            println!("  {:<15} {}", lang, url);
        }
    }

    println!();
    if all_found && any_engine {
        println!("{} Extraction tools are available", style("✓").green());
    } else {
        println!(
            "{} Some tools are missing. Install them for full extraction support:",
            style("!").yellow()
        );
        println!("  - pdftotext, pdftoppm, pdfinfo: poppler-utils package");
        println!("  - tesseract: tesseract-ocr package");
    }

    Ok(())
}
