//! List SageMaker endpoints and send them text.
//!
//! Region and credentials come from `config.properties` (or the file named
//! by `AWS_INFERENCE_CONFIG`):
//!
//! ```properties
//! aws.region=us-east-1
//! aws.accessKeyId=...
//! aws.secretAccessKey=...
//! ```
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example sagemaker_endpoints
//! ```

use aws_inference::config::default_path;
use aws_inference::samples::endpoints::EndpointHandler;
use aws_inference::{ClientBuilder, LoggingConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    LoggingConfig::new().init()?;

    info!("Starting SageMaker endpoint demo");

    let builder = ClientBuilder::new().from_properties_file(default_path())?;
    let handler = EndpointHandler::from_builder(&builder)?;

    if let Err(e) = handler.list_endpoints().await {
        info!("Continuing without an endpoint list: {}", e);
    }

    handler.send_request(None, None).await;
    handler
        .send_request(Some("your-endpoint-name"), Some("Custom query text"))
        .await;
    handler.send_request(None, Some("Another custom query")).await;

    info!("SageMaker endpoint demo finished");
    Ok(())
}
