use crate::MessageId;

/// One downstream message and the slice of the turn's text it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputWindow {
    /// Offset of the slice, in characters.
    pub offset: usize,
    /// Capacity of the slice, in characters.
    pub len: usize,
    /// Exactly what the surface currently displays.
    pub rendered: String,
    pub formatted: bool,
    pub message_id: MessageId,
}

impl OutputWindow {
    pub fn new(offset: usize, len: usize, message_id: MessageId) -> Self {
        Self {
            offset,
            len,
            rendered: String::new(),
            formatted: false,
            message_id,
        }
    }

    pub fn index(&self) -> usize {
        self.offset.checked_div(self.len).unwrap_or_default()
    }

    /// The characters of `text` covered by this window.
    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        char_slice(text, self.offset, self.len)
    }
}

/// Slices `text` by character positions, clamping at the end.
pub(crate) fn char_slice(text: &str, offset: usize, len: usize) -> &str {
    let mut indices = text.char_indices().map(|(index, _)| index);
    let start = indices.nth(offset).unwrap_or(text.len());
    let end = if len == 0 {
        start
    } else {
        text[start..]
            .char_indices()
            .nth(len)
            .map_or(text.len(), |(index, _)| start + index)
    };
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_slice_respects_multibyte_boundaries() {
        let text = "привет мир";
        assert_eq!(char_slice(text, 0, 6), "привет");
        assert_eq!(char_slice(text, 7, 100), "мир");
        assert_eq!(char_slice(text, 42, 3), "");
    }

    #[test]
    fn window_reports_its_index() {
        let window = OutputWindow::new(8000, 4000, MessageId::from(3_i64));
        assert_eq!(window.index(), 2);
        assert_eq!(window.slice(&"a".repeat(8010)), "a".repeat(10));
    }
}
