use crate::constants::NO_DESCRIPTION;
use crate::models::AppConfig;
use crate::services::{reconcile_urls, UpstreamClient};

pub async fn run(parser_url: &str, backend_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let client = UpstreamClient::from_config(&config)?;

    println!("🔍 Comparing descriptors");
    println!("   Parser:  {}", parser_url);
    println!("   Backend: {}", backend_url);

    let result = reconcile_urls(&client, parser_url, backend_url).await?;

    println!(
        "\n📋 Screen '{}': {} elements, {} matched\n",
        result.screen,
        result.elements.len(),
        result.matched_count()
    );
    for element in &result.elements {
        let marker = if element.description == NO_DESCRIPTION { "·" } else { "✓" };
        println!("   {} {:<32} {}", marker, element.tag, element.description);
    }

    println!("\n{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
