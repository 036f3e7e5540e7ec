use crate::models::Chunk;

pub const DEFAULT_CHUNK_MAX_CHARS: usize = 1_000;

const BOUNDARY_WINDOW: usize = 200;

pub fn chunk_text(text: &str, max_len: usize) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }

    let max_len = max_len.max(1);
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut ordinal = 0u32;

    while start < total {
        let mut end = (start + max_len).min(total);

        if end < total {
            let window_start = end.saturating_sub(BOUNDARY_WINDOW).max(start);
            end = find_break(&chars, window_start, end, &['.', '\n'])
                .or_else(|| find_break(&chars, window_start, end, &[',', ' ']))
                .unwrap_or(end);
        }

        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            chunks.push(Chunk {
                text: trimmed.to_string(),
                ordinal,
            });
            ordinal += 1;
        }

        start = end;
    }

    chunks
}

fn find_break(chars: &[char], window_start: usize, end: usize, breaks: &[char]) -> Option<usize> {
    (window_start + 1..=end)
        .rev()
        .find(|&position| breaks.contains(&chars[position]))
        .map(|position| position + 1)
}
