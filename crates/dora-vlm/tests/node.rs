use std::io::Cursor;

use dora_image_utils::{ImageUtilsError, Rgb8};
use dora_vlm::conversation::{Message, Role};
use dora_vlm::model::VisionLanguageModel;
use dora_vlm::{IgnoreReason, NodeEvent, Outcome, TextOutput, VlmConfig, VlmError, VlmNode};

#[derive(Debug, thiserror::Error)]
#[error("out of memory")]
struct OutOfMemory;

/// Answers with a counter and remembers what it was asked.
#[derive(Default)]
struct MockModel {
    prompts: Vec<String>,
    images: Vec<Vec<Vec<u8>>>,
    fail: bool,
}

impl VisionLanguageModel for MockModel {
    type Error = OutOfMemory;

    fn generate(
        &mut self,
        prompt: &str,
        images: Vec<Rgb8>,
        _max_new_tokens: usize,
    ) -> Result<String, Self::Error> {
        if self.fail {
            return Err(OutOfMemory);
        }
        self.prompts.push(prompt.to_string());
        self.images
            .push(images.iter().map(|i| i.as_slice().to_vec()).collect());
        Ok(format!("answer {}", self.prompts.len()))
    }
}

fn node(config: VlmConfig) -> VlmNode<MockModel> {
    VlmNode::new(&config, MockModel::default()).unwrap()
}

fn rgb_image(id: &str, pixel: [u8; 3]) -> NodeEvent {
    NodeEvent::Image {
        id: id.to_string(),
        data: pixel.to_vec(),
        encoding: "rgb8".to_string(),
        width: 1,
        height: 1,
    }
}

fn text(value: &str) -> NodeEvent {
    NodeEvent::Text {
        id: "text".to_string(),
        text: Some(value.to_string()),
        image_id: None,
    }
}

#[test]
fn empty_text_produces_nothing() -> Result<(), VlmError> {
    let mut vlm = node(VlmConfig::default());
    vlm.handle(rgb_image("image", [1, 2, 3]))?;

    let outcome = vlm.handle(NodeEvent::Text {
        id: "text".to_string(),
        text: None,
        image_id: None,
    })?;
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::EmptyText));

    let outcome = vlm.handle(text("   "))?;
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::EmptyText));

    assert!(vlm.model().prompts.is_empty());
    Ok(())
}

#[test]
fn text_without_frames_produces_nothing() -> Result<(), VlmError> {
    let mut vlm = node(VlmConfig::default());

    let outcome = vlm.handle(text("What do you see?"))?;
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::NoFrames));
    // the question is still remembered
    assert_eq!(vlm.pending_question(), "What do you see?");
    assert!(vlm.model().prompts.is_empty());
    Ok(())
}

#[test]
fn activation_words_filter() -> Result<(), VlmError> {
    let mut vlm = node(VlmConfig {
        activation_words: vec!["what".to_string(), "describe".to_string()],
        ..Default::default()
    });
    vlm.handle(rgb_image("image", [1, 2, 3]))?;

    let outcome = vlm.handle(text("hello there"))?;
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::NoActivationWord));
    assert_eq!(vlm.pending_question(), "Describe this image");

    // whole words only
    let outcome = vlm.handle(text("whatever"))?;
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::NoActivationWord));

    let outcome = vlm.handle(text("please describe the scene"))?;
    assert_eq!(
        outcome,
        Outcome::Responded(TextOutput {
            text: "answer 1".to_string(),
            image_id: "all".to_string(),
        })
    );
    Ok(())
}

#[test]
fn responds_with_all_frames_in_order() -> Result<(), VlmError> {
    let mut vlm = node(VlmConfig {
        system_prompt: "Be brief.".to_string(),
        ..Default::default()
    });
    vlm.handle(rgb_image("image_left", [1, 1, 1]))?;
    vlm.handle(rgb_image("image_right", [2, 2, 2]))?;
    vlm.handle(rgb_image("image_left", [3, 3, 3]))?;

    let outcome = vlm.handle(text("Compare them"))?;
    assert!(matches!(
        outcome,
        Outcome::Responded(TextOutput { ref image_id, .. }) if image_id == "all"
    ));

    let model = vlm.model();
    assert_eq!(model.images[0], vec![vec![3, 3, 3], vec![2, 2, 2]]);
    assert_eq!(
        model.prompts[0],
        "<|im_start|>System: Be brief.<end_of_utterance>\n\
         User:<image><image>Compare them<end_of_utterance>\n\
         Assistant:"
    );
    Ok(())
}

#[test]
fn responds_for_a_single_frame() -> Result<(), VlmError> {
    let mut vlm = node(VlmConfig::default());
    vlm.handle(rgb_image("image_left", [1, 1, 1]))?;
    vlm.handle(rgb_image("image_right", [2, 2, 2]))?;

    let outcome = vlm.handle(NodeEvent::Text {
        id: "text".to_string(),
        text: Some("What is on the right?".to_string()),
        image_id: Some("image_right".to_string()),
    })?;
    assert_eq!(
        outcome,
        Outcome::Responded(TextOutput {
            text: "answer 1".to_string(),
            image_id: "image_right".to_string(),
        })
    );
    assert_eq!(vlm.model().images[0], vec![vec![2, 2, 2]]);

    let outcome = vlm.handle(NodeEvent::Text {
        id: "text".to_string(),
        text: Some("And the top?".to_string()),
        image_id: Some("image_top".to_string()),
    })?;
    assert_eq!(
        outcome,
        Outcome::Ignored(IgnoreReason::UnknownFrame("image_top".to_string()))
    );
    Ok(())
}

#[test]
fn history_grows_by_pairs() -> Result<(), VlmError> {
    let mut vlm = node(VlmConfig {
        system_prompt: "Be brief.".to_string(),
        history: true,
        ..Default::default()
    });
    vlm.handle(rgb_image("image", [1, 2, 3]))?;

    let questions = ["First?", "Second?", "Third?"];
    for question in questions {
        vlm.handle(text(question))?;
    }

    let messages = vlm.history().messages();
    assert_eq!(messages.len(), 1 + 2 * questions.len());
    assert_eq!(messages[0], Message::text(Role::System, "Be brief."));
    for (i, question) in questions.iter().enumerate() {
        assert_eq!(messages[1 + 2 * i], Message::text(Role::User, *question));
        assert_eq!(
            messages[2 + 2 * i],
            Message::text(Role::Assistant, format!("answer {}", i + 1))
        );
    }
    Ok(())
}

#[test]
fn default_history_cap_keeps_the_latest_exchanges() -> Result<(), VlmError> {
    let mut vlm = node(VlmConfig {
        system_prompt: "Be brief.".to_string(),
        history: true,
        ..Default::default()
    });
    vlm.handle(rgb_image("image", [1, 2, 3]))?;

    // 64 retained turns hold 32 exchanges
    for i in 0..33 {
        vlm.handle(text(&format!("Question {i}?")))?;
    }

    let messages = vlm.history().messages();
    assert_eq!(messages.len(), 1 + 64);
    assert_eq!(messages[0], Message::text(Role::System, "Be brief."));
    assert_eq!(messages[1], Message::text(Role::User, "Question 1?"));
    assert_eq!(messages[64], Message::text(Role::Assistant, "answer 33"));
    Ok(())
}

#[test]
fn history_disabled_stays_put() -> Result<(), VlmError> {
    let mut vlm = node(VlmConfig::default());
    vlm.handle(rgb_image("image", [1, 2, 3]))?;
    vlm.handle(text("First?"))?;
    vlm.handle(text("Second?"))?;

    assert_eq!(vlm.history().len(), 1);
    assert!(!vlm.model().prompts[1].contains("First?"));
    Ok(())
}

#[test]
fn bgr_and_compressed_frames_are_rgb() -> Result<(), Box<dyn std::error::Error>> {
    let mut vlm = node(VlmConfig::default());

    vlm.handle(NodeEvent::Image {
        id: "image_bgr".to_string(),
        data: vec![255, 0, 0, 0, 255, 0],
        encoding: "bgr8".to_string(),
        width: 2,
        height: 1,
    })?;

    let png = {
        let img = image::RgbImage::from_raw(2, 1, vec![10, 20, 30, 40, 50, 60]).unwrap();
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png)?;
        bytes.into_inner()
    };
    vlm.handle(NodeEvent::Image {
        id: "image_png".to_string(),
        data: png,
        encoding: "png".to_string(),
        width: 0,
        height: 0,
    })?;

    vlm.handle(text("Describe"))?;
    assert_eq!(
        vlm.model().images[0],
        vec![vec![0, 0, 255, 0, 255, 0], vec![10, 20, 30, 40, 50, 60]]
    );
    Ok(())
}

#[test]
fn unsupported_encoding_is_rejected() {
    let mut vlm = node(VlmConfig::default());
    let err = vlm
        .handle(NodeEvent::Image {
            id: "image".to_string(),
            data: vec![0; 4],
            encoding: "yuv420".to_string(),
            width: 2,
            height: 1,
        })
        .unwrap_err();

    assert!(matches!(
        err,
        VlmError::Image(ImageUtilsError::UnsupportedEncoding(ref e)) if e == "yuv420"
    ));
    assert!(!err.is_fatal());
    assert!(vlm.frames().is_empty());
}

#[test]
fn oversized_frame_is_rejected_and_node_keeps_running() -> Result<(), VlmError> {
    let mut vlm = node(VlmConfig::default());
    let err = vlm
        .handle(NodeEvent::Image {
            id: "image".to_string(),
            data: Vec::new(),
            encoding: "rgb8".to_string(),
            width: usize::MAX / 2,
            height: 4,
        })
        .unwrap_err();

    assert!(matches!(err, VlmError::Image(ImageUtilsError::ImageTooLarge(_, 4))));
    assert!(!err.is_fatal());
    assert!(vlm.frames().is_empty());

    vlm.handle(rgb_image("image", [9, 9, 9]))?;
    assert!(matches!(vlm.handle(text("And now?"))?, Outcome::Responded(_)));
    Ok(())
}

#[test]
fn upstream_errors_are_logged_and_ignored() -> Result<(), VlmError> {
    let mut vlm = node(VlmConfig::default());
    let outcome = vlm.handle(NodeEvent::Error("camera disconnected".to_string()))?;
    assert_eq!(
        outcome,
        Outcome::Ignored(IgnoreReason::UpstreamError("camera disconnected".to_string()))
    );
    Ok(())
}

#[test]
fn model_failure_is_fatal() {
    let model = MockModel {
        fail: true,
        ..Default::default()
    };
    let mut vlm = VlmNode::new(&VlmConfig::default(), model).unwrap();
    vlm.handle(rgb_image("image", [1, 2, 3])).unwrap();

    let err = vlm.handle(text("Describe")).unwrap_err();
    assert!(matches!(err, VlmError::Model(_)));
    assert!(err.is_fatal());
}
