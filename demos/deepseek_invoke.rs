//! Ask DeepSeek R1 a question with `InvokeModel` and its native request body.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example deepseek_invoke
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

    deepseek::invoke_model(&client, &mut io::stdout()).await?;

    Ok(())
}
