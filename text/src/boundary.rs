//! Line and word boundary queries.
//!
//! Every query runs as a single [`Buffer::read`] so it sees one consistent state of the
//! storage, even while other threads are editing.
//!
//! Line scans never fetch the whole document. They read a window of
//! [`BufferConfig::boundary_window`] code points on each side of the offset and double
//! the window until a `'\n'` or the edge of the document turns up.

use crate::{
    buffer::Buffer, config::BufferConfig, error::Result, region::Region, storage::TextStorage,
};

impl Buffer {
    /// The line containing `offset`, without its terminator.
    ///
    /// Offsets at or past the end of the document give `{size, size}`.
    pub fn line(&self, offset: usize) -> Result<Region> {
        let window = self.config().boundary_window;
        self.read(move |storage| line_at(storage, offset, window))
    }

    /// Covers the lines at both ends of `region`.
    pub fn line_r(&self, region: Region) -> Result<Region> {
        let window = self.config().boundary_window;
        self.read(move |storage| {
            let start = line_at(storage, region.begin(), window);
            let end = line_at(storage, region.end(), window);
            Region::new(start.begin(), end.end())
        })
    }

    /// The line containing `offset` including its `'\n'`, if it has one.
    pub fn full_line(&self, offset: usize) -> Result<Region> {
        let window = self.config().boundary_window;
        self.read(move |storage| full_line_at(storage, offset, window))
    }

    pub fn full_line_r(&self, region: Region) -> Result<Region> {
        let window = self.config().boundary_window;
        self.read(move |storage| full_line_r_at(storage, region, window))
    }

    /// One region per line touched by `region`, each without its terminator.
    pub fn lines(&self, region: Region) -> Result<Vec<Region>> {
        let window = self.config().boundary_window;
        self.read(move |storage| {
            let region = full_line_r_at(storage, region, window);
            let text = storage.substr(region);

            let mut lines = Vec::new();
            let mut last = region.begin();
            for (i, &ch) in text.iter().enumerate() {
                if ch == '\n' {
                    lines.push(Region::new(last, region.begin() + i));
                    last = region.begin() + i + 1;
                }
            }
            if last != region.end() {
                lines.push(Region::new(last, region.end()));
            }
            lines
        })
    }

    /// The word around `offset`.
    ///
    /// A "word" is a run of code points of one class: word body, punctuation and
    /// whitespace from [`BufferConfig::word_separators`] and
    /// [`BufferConfig::word_whitespace`], or plain spaces. A cursor sitting right after a
    /// punctuation run selects the run that follows it.
    pub fn word(&self, offset: usize) -> Result<Region> {
        let config = self.config().clone();
        self.read(move |storage| word_at(storage, offset, &config))
    }

    /// Covers the words at both ends of `region`.
    pub fn word_r(&self, region: Region) -> Result<Region> {
        let config = self.config().clone();
        self.read(move |storage| {
            let start = word_at(storage, region.begin(), &config);
            let end = word_at(storage, region.end(), &config);
            Region::new(start.begin(), end.end())
        })
    }
}

fn line_at(storage: &dyn TextStorage, offset: usize, window: usize) -> Region {
    let size = storage.size();
    if offset >= size {
        return Region::caret(size);
    }
    Region::new(
        scan_line_start(storage, offset, window),
        scan_line_end(storage, offset, size, window),
    )
}

fn full_line_at(storage: &dyn TextStorage, offset: usize, window: usize) -> Region {
    let mut region = line_at(storage, offset, window);
    // `line_at` stops on the '\n' itself
    if region.b < storage.size() {
        region.b += 1;
    }
    region
}

fn full_line_r_at(storage: &dyn TextStorage, region: Region, window: usize) -> Region {
    let start = full_line_at(storage, region.begin(), window);
    let end = full_line_at(storage, region.end(), window);
    Region::new(start.begin(), end.end())
}

/// Offset just past the closest `'\n'` before `offset`, or 0.
fn scan_line_start(storage: &dyn TextStorage, offset: usize, window: usize) -> usize {
    let mut end = offset;
    let mut window = window;
    loop {
        let start = end.saturating_sub(window);
        let chunk = storage.substr(Region::new(start, end));
        if let Some(i) = chunk.iter().rposition(|&ch| ch == '\n') {
            return start + i + 1;
        }
        if start == 0 {
            return 0;
        }
        end = start;
        window = window.saturating_mul(2);
    }
}

/// Offset of the first `'\n'` at or after `offset`, or `size`.
fn scan_line_end(storage: &dyn TextStorage, offset: usize, size: usize, window: usize) -> usize {
    let mut start = offset;
    let mut window = window;
    loop {
        let end = start.saturating_add(window).min(size);
        let chunk = storage.substr(Region::new(start, end));
        if let Some(i) = chunk.iter().position(|&ch| ch == '\n') {
            return start + i;
        }
        if end == size {
            return size;
        }
        start = end;
        window = window.saturating_mul(2);
    }
}

fn word_at(storage: &dyn TextStorage, offset: usize, config: &BufferConfig) -> Region {
    let full = full_line_at(storage, offset, config.boundary_window);
    let line = storage.substr(full);
    if line.is_empty() {
        return Region::caret(offset);
    }
    let col = (offset - full.begin()).min(line.len() - 1);

    let mut last_boundary = true;
    let mut last_space = false;
    let mut run_start = 0;
    let mut last_non_space = 0;
    for (i, &ch) in line.iter().enumerate() {
        let boundary = config.is_word_boundary(ch);
        let space = ch == ' ';
        if !space {
            last_non_space = i;
        }
        if boundary == last_boundary && space == last_space {
            continue;
        }
        last_space = space;

        let run = Region::new(run_start, i);
        if i != 0 && run.contains(col) {
            let run = Region::new(run.a + full.begin(), run.b + full.begin());
            // Don't hand back the punctuation run that ends right at the cursor
            if !(run.b == offset && last_boundary) {
                return run;
            }
        }
        run_start = i;
        last_boundary = boundary;
    }

    // The cursor is in the line's last run
    let mut region = Region::new(full.begin() + run_start, full.end());
    let last_non_space = full.begin() + last_non_space;
    if last_non_space != offset && !config.is_whitespace(storage.index(region.a)) {
        region.b = last_non_space;
    }
    if region.a == offset && region.b == region.a + 1 {
        region.b -= 1;
    }
    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NaiveStorage;

    fn buffer_with_window(text: &str, window: usize) -> Buffer {
        let config = BufferConfig {
            boundary_window: window,
            ..BufferConfig::default()
        };
        let mut storage = NaiveStorage::new(config.chunk_size);
        storage.insert(0, &text.chars().collect::<Vec<_>>());
        Buffer::with_storage(Box::new(storage), config).unwrap()
    }

    fn words(buffer: &Buffer, offsets: impl IntoIterator<Item = usize>) -> Vec<(usize, usize)> {
        offsets
            .into_iter()
            .map(|offset| {
                let region = buffer.word(offset).unwrap();
                (region.a, region.b)
            })
            .collect()
    }

    #[test]
    fn line_excludes_terminator() {
        quill_log::test();
        let buffer = Buffer::with_text("abc\ndef");
        assert_eq!(buffer.line(5).unwrap(), Region::new(4, 7));
        assert_eq!(buffer.line(3).unwrap(), Region::new(0, 3));
        assert_eq!(buffer.line(4).unwrap(), Region::new(4, 7));
        assert_eq!(buffer.line(0).unwrap(), Region::new(0, 3));
        assert_eq!(buffer.line(100).unwrap(), Region::new(7, 7));
    }

    #[test]
    fn line_scan_doubles_its_window() {
        let text = format!("{}\n{}", "x".repeat(1000), "y".repeat(500));
        let buffer = buffer_with_window(&text, 4);

        assert_eq!(buffer.line(700).unwrap(), Region::new(0, 1000));
        assert_eq!(buffer.line(1200).unwrap(), Region::new(1001, 1501));
        assert_eq!(buffer.full_line(10).unwrap(), Region::new(0, 1001));
        assert_eq!(buffer.full_line(1500).unwrap(), Region::new(1001, 1501));
    }

    #[test]
    fn scan_on_empty_buffer() {
        let buffer = Buffer::new();
        assert_eq!(buffer.line(0).unwrap(), Region::caret(0));
        assert_eq!(buffer.full_line(0).unwrap(), Region::caret(0));
        assert_eq!(buffer.word(0).unwrap(), Region::caret(0));
        assert!(buffer.lines(Region::caret(0)).unwrap().is_empty());
    }

    #[test]
    fn full_line_keeps_carriage_return_in_body() {
        let buffer = Buffer::with_text("abc\r\ndef");
        assert_eq!(buffer.line(1).unwrap(), Region::new(0, 4));
        assert_eq!(buffer.full_line(1).unwrap(), Region::new(0, 5));
        assert_eq!(buffer.full_line(6).unwrap(), Region::new(5, 8));
    }

    #[test]
    fn region_queries_cover_both_ends() {
        let buffer = Buffer::with_text("abc\ndef\nghi");
        assert_eq!(buffer.line_r(Region::new(5, 1)).unwrap(), Region::new(0, 7));
        assert_eq!(buffer.full_line_r(Region::new(1, 5)).unwrap(), Region::new(0, 8));
        assert_eq!(
            buffer.lines(Region::new(1, 5)).unwrap(),
            vec![Region::new(0, 3), Region::new(4, 7)]
        );
        assert_eq!(buffer.lines(Region::caret(9)).unwrap(), vec![Region::new(8, 11)]);
        assert_eq!(
            buffer.lines(Region::new(0, 11)).unwrap(),
            vec![Region::new(0, 3), Region::new(4, 7), Region::new(8, 11)]
        );
    }

    #[test]
    fn words_in_a_short_line() {
        let buffer = Buffer::with_text("one two");
        assert_eq!(
            words(&buffer, 0..=7),
            vec![
                (0, 3),
                (0, 3),
                (0, 3),
                (0, 3),
                (4, 6),
                (4, 6),
                (4, 7),
                (7, 7)
            ]
        );
        assert_eq!(buffer.word_r(Region::new(1, 5)).unwrap(), Region::new(0, 6));
    }

    #[test]
    fn words_across_lines_and_punctuation() {
        let buffer = Buffer::with_text("hello world\nfoo.bar baz\n");
        let mut expected = Vec::new();
        expected.extend([(0, 5); 6]);
        expected.extend([(6, 11); 6]);
        expected.extend([(12, 15); 4]);
        expected.extend([(16, 19); 4]);
        expected.extend([(20, 23); 4]);
        expected.extend([(24, 24), (25, 25)]);
        assert_eq!(words(&buffer, 0..=25), expected);
    }

    #[test]
    fn words_skip_punctuation_ending_at_cursor() {
        let buffer = Buffer::with_text("foo(bar)");
        let mut expected = Vec::new();
        expected.extend([(0, 3); 4]);
        expected.extend([(4, 7); 4]);
        expected.push((8, 8));
        assert_eq!(words(&buffer, 0..=8), expected);
    }

    #[test]
    fn words_around_spaces() {
        let buffer = Buffer::with_text("  x  ");
        assert_eq!(
            words(&buffer, 0..=5),
            vec![(0, 2), (0, 2), (2, 3), (2, 3), (3, 5), (5, 5)]
        );
    }

    #[test]
    fn single_code_point_words_collapse() {
        assert_eq!(words(&Buffer::with_text("a"), 0..=1), vec![(0, 0), (1, 1)]);
        assert_eq!(
            words(&Buffer::with_text("\n\n"), 0..=2),
            vec![(0, 0), (1, 1), (2, 2)]
        );
    }

    #[test]
    fn queries_follow_edits() {
        let buffer = Buffer::with_text("abc");
        buffer.insert(3, "\nxyz").unwrap();
        assert_eq!(buffer.line(5).unwrap(), Region::new(4, 7));
        buffer.erase(3, 1).unwrap();
        assert_eq!(buffer.line(5).unwrap(), Region::new(0, 6));
    }

    #[test]
    fn lines_see_one_state_during_concurrent_edits() {
        use std::{
            sync::{
                atomic::{AtomicBool, Ordering},
                Arc,
            },
            thread,
        };

        quill_log::test();
        let buffer = Arc::new(Buffer::with_text("one\ntwo\n"));
        let stop = Arc::new(AtomicBool::new(false));

        // Flips between "one\ntwo\n" and "\none\ntwo\n"
        let writer = {
            let buffer = buffer.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    buffer.insert(0, "\n").unwrap();
                    buffer.erase(0, 1).unwrap();
                }
            })
        };

        let unshifted = vec![Region::new(0, 3), Region::new(4, 7)];
        let shifted = vec![Region::new(0, 0), Region::new(1, 4), Region::new(5, 8)];
        for _ in 0..2000 {
            let lines = buffer.lines(Region::new(0, 8)).unwrap();
            assert!(
                lines == unshifted || lines == shifted,
                "lines mixed two states: {lines:?}"
            );
        }

        stop.store(true, Ordering::SeqCst);
        writer.join().unwrap();
    }
}
