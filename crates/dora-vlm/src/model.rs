use dora_image_utils::Rgb8;

/// A vision-language model driven by a pre-rendered prompt.
///
/// The prompt carries one image placeholder per entry of `images`, in the
/// same order. Implementations return only the newly generated text.
pub trait VisionLanguageModel {
    type Error: std::error::Error + Send + Sync + 'static;

    fn generate(
        &mut self,
        prompt: &str,
        images: Vec<Rgb8>,
        max_new_tokens: usize,
    ) -> Result<String, Self::Error>;
}
