/// The single shared text. Every write replaces the whole content.
#[derive(Debug, Default)]
pub struct DocumentStore {
    content: String,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> &str {
        &self.content
    }

    /// Last write wins, in the order writes reach the hub.
    pub fn write(&mut self, content: String) {
        self.content = content;
    }

    /// Length of the content in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
