//! Stream DeepSeek R1 reasoning and answer text with `ConverseStream`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example deepseek_converse_stream
//! ```

use aws_inference::samples::{deepseek, BEDROCK_SAMPLE_REGION};
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

    let accumulator = deepseek::converse_stream(&client, &mut io::stdout()).await?;
    tracing::debug!(stop_reason = ?accumulator.stop_reason(), "Stream finished");

    Ok(())
}
