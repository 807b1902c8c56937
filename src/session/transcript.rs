use serde::Serialize;

/// Running transcript of one session, built from model fragments
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    text: String,
    chunk_count: usize,
}

/// What a successful append produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptUpdate {
    /// The fragment that was just appended
    pub chunk: String,
    /// Whole transcript including `chunk`
    pub text: String,
    /// Fragments appended so far
    pub chunk_count: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment at the tail
    ///
    /// Fragments arrive pre-segmented, so no separator is inserted. Empty and
    /// whitespace-only fragments are ignored and return `None`.
    pub fn append(&mut self, fragment: &str) -> Option<TranscriptUpdate> {
        if fragment.trim().is_empty() {
            return None;
        }

        self.text.push_str(fragment);
        self.chunk_count += 1;

        Some(TranscriptUpdate {
            chunk: fragment.to_string(),
            text: self.text.clone(),
            chunk_count: self.chunk_count,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
