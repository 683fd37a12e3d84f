use dora_image_utils::Rgb8;

/// Latest decoded frame per input identifier.
///
/// Frames keep the order in which their identifier was first seen, so the
/// images of a multi camera prompt are always bound in the same order.
#[derive(Default)]
pub struct FrameStore {
    frames: Vec<(String, Rgb8)>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `frame` under `id`, replacing the previous frame with that id.
    pub fn insert(&mut self, id: impl Into<String>, frame: Rgb8) {
        let id = id.into();
        match self.frames.iter_mut().find(|(key, _)| *key == id) {
            Some((_, slot)) => *slot = frame,
            None => self.frames.push((id, frame)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Rgb8> {
        self.frames
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, frame)| frame)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Frames in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rgb8)> {
        self.frames.iter().map(|(id, frame)| (id.as_str(), frame))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
