//! Offer Claude 3 Haiku a `queryWeather` tool through `Converse`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example tool_use
//! ```

use aws_inference::samples::{tool_use, BEDROCK_SAMPLE_REGION};
use aws_inference::{ClientBuilder, InferenceConfig, LoggingConfig};
use std::io;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    LoggingConfig::new().init()?;

    let config = InferenceConfig::builder()
        .region(BEDROCK_SAMPLE_REGION)
        .from_env()
        .build()?;
    let client = ClientBuilder::new().config(config).from_env().bedrock_runtime()?;

    tool_use::converse_with_weather_tool(&client, &mut io::stdout()).await?;

    Ok(())
}
