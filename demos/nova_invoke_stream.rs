//! Stream a Nova Lite answer with `InvokeModelWithResponseStream`.
//!
//! ## Usage
//!
//! ```bash
//! export AWS_ACCESS_KEY_ID=...
//! export AWS_SECRET_ACCESS_KEY=...
//! cargo run --example nova_invoke_stream
//! ```

use aws_inference::samples::{nova, BEDROCK_SAMPLE_REGION};
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

    let result = nova::invoke_model_with_response_stream(&client, &mut io::stdout()).await?;
    println!("\nFinal result: {}", result);

    Ok(())
}
