use cropwise_core::engine::Recommendation;
use cropwise_core::error::CropwiseError;

pub fn print(recommendations: &[Recommendation]) -> Result<(), CropwiseError> {
    let json = serde_json::to_string_pretty(recommendations)?;
    println!("{json}");
    Ok(())
}
