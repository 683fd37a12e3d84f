use dora_image_utils::{MetadataExt, PixelEncoding};
use dora_node_api::arrow::array::{Array, StringArray, UInt8Array};
use dora_node_api::MetadataParameters;

use crate::error::VlmError;
use crate::node::NodeEvent;

/// Map a dora input onto a [`NodeEvent`].
///
/// Inputs are routed by id: ids containing `image` carry frames, ids
/// containing `text` carry prompts. Any other input yields `Ok(None)`.
///
/// Frames need an `encoding` entry. Planar encodings also need non-negative
/// integer `width` and `height` entries.
pub fn node_event_from_input(
    id: &str,
    metadata: &MetadataParameters,
    data: &dyn Array,
) -> Result<Option<NodeEvent>, VlmError> {
    if id.contains("image") {
        let encoding = metadata.require_str("encoding")?;
        // compressed streams carry their own size
        let (width, height) = if encoding.parse::<PixelEncoding>()?.is_compressed() {
            (0, 0)
        } else {
            (
                metadata.require_usize("width")?,
                metadata.require_usize("height")?,
            )
        };

        Ok(Some(NodeEvent::Image {
            id: id.to_string(),
            data: bytes_from_array(id, data)?,
            encoding: encoding.to_string(),
            width,
            height,
        }))
    } else if id.contains("text") {
        Ok(Some(NodeEvent::Text {
            id: id.to_string(),
            text: text_from_array(id, data)?,
            image_id: metadata.get_str("image_id").map(str::to_string),
        }))
    } else {
        Ok(None)
    }
}

fn bytes_from_array(id: &str, data: &dyn Array) -> Result<Vec<u8>, VlmError> {
    data.as_any()
        .downcast_ref::<UInt8Array>()
        .map(|array| array.values().to_vec())
        .ok_or_else(|| VlmError::InvalidPayload {
            id: id.to_string(),
            expected: "UInt8",
            actual: data.data_type().to_string(),
        })
}

// only the first string of the batch is a prompt
fn text_from_array(id: &str, data: &dyn Array) -> Result<Option<String>, VlmError> {
    let array = data
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| VlmError::InvalidPayload {
            id: id.to_string(),
            expected: "Utf8",
            actual: data.data_type().to_string(),
        })?;

    if array.is_empty() || array.is_null(0) {
        return Ok(None);
    }

    Ok(Some(array.value(0).to_string()))
}
