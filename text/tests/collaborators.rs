//! Tests for collaborators built on the observer contract.
//!
//! Verifies that an undo log can reverse every recorded edit, that a selection set stays
//! anchored to its text across inserts and erases, and that line queries agree with the
//! document for every offset.

use parking_lot::Mutex;
use quill_text::{Buffer, BufferObserver, Region, RegionSet};
use std::sync::Arc;

enum Edit {
    Inserted(Region),
    Erased(usize, Vec<char>),
}

#[derive(Default)]
struct UndoLog {
    edits: Mutex<Vec<Edit>>,
}

impl UndoLog {
    fn undo_all(&self, buffer: &Buffer) {
        let edits = std::mem::take(&mut *self.edits.lock());
        for edit in edits.into_iter().rev() {
            match edit {
                Edit::Inserted(region) => buffer.erase(region.begin(), region.size()).unwrap(),
                Edit::Erased(point, data) => buffer.insert_r(point, &data).unwrap(),
            }
        }
    }
}

impl BufferObserver for UndoLog {
    fn erased(&self, _: &Buffer, region: Region, data: &[char]) {
        self.edits
            .lock()
            .push(Edit::Erased(region.begin(), data.to_vec()));
    }

    fn inserted(&self, _: &Buffer, region: Region, _: &[char]) {
        self.edits.lock().push(Edit::Inserted(region));
    }
}

#[derive(Default)]
struct Selections {
    regions: Mutex<RegionSet>,
}

impl BufferObserver for Selections {
    fn erased(&self, _: &Buffer, region: Region, _: &[char]) {
        let delta = -(region.size() as isize);
        self.regions.lock().adjust(region.end(), delta);
    }

    fn inserted(&self, _: &Buffer, region: Region, _: &[char]) {
        self.regions
            .lock()
            .adjust(region.begin(), region.size() as isize);
    }
}

fn contents(buffer: &Buffer) -> String {
    buffer
        .substr(Region::new(0, buffer.size().unwrap()))
        .unwrap()
}

#[test]
fn undo_log_restores_original_text() {
    quill_log::test();
    let original = "fn main() {\n    println!(\"hi\");\n}\n";
    let buffer = Buffer::with_text(original);
    let undo = Arc::new(UndoLog::default());
    buffer.add_observer(undo.clone()).unwrap();

    buffer.insert(12, "    let x = 1;\n").unwrap();
    buffer.erase(0, 3).unwrap();
    buffer.insert(1000, "// end\n").unwrap();
    buffer.erase(20, 500).unwrap();
    buffer.insert(0, "ñ😀").unwrap();
    assert_ne!(contents(&buffer), original);

    // Replaying the inverses must not be recorded again
    buffer.remove_observer(undo.clone()).unwrap();
    undo.undo_all(&buffer);

    assert_eq!(contents(&buffer), original);
    assert_eq!(buffer.change_count(), 10);
}

#[test]
fn selections_follow_edits() {
    let buffer = Buffer::with_text("hello world");
    let selections = Arc::new(Selections::default());
    selections.regions.lock().add(Region::new(6, 11));
    buffer.add_observer(selections.clone()).unwrap();

    buffer.insert(6, "big ").unwrap();
    buffer.erase(0, 6).unwrap();

    let region = selections.regions.lock().get(0).unwrap();
    assert_eq!(region, Region::new(4, 9));
    assert_eq!(buffer.substr(region).unwrap(), "world");
}

#[test]
fn selection_inside_erased_text_collapses() {
    let buffer = Buffer::with_text("abcdefgh");
    let selections = Arc::new(Selections::default());
    selections.regions.lock().add(Region::new(3, 5));
    selections.regions.lock().add(Region::caret(7));
    buffer.add_observer(selections.clone()).unwrap();

    buffer.erase(2, 4).unwrap();

    assert_eq!(contents(&buffer), "abgh");
    assert_eq!(
        selections.regions.lock().regions(),
        &[Region::caret(2), Region::caret(3)]
    );
}

#[test]
fn line_queries_agree_with_text() {
    let text = "first\n\nthird line\r\n\tfourth\nlast";
    let buffer = Buffer::with_text(text);
    let chars: Vec<char> = text.chars().collect();

    for offset in 0..chars.len() {
        let line = buffer.line(offset).unwrap();
        assert!(line.contains(offset), "line {line} misses {offset}");
        assert!(!buffer.substr(line).unwrap().contains('\n'));

        let full = buffer.full_line(offset).unwrap();
        assert_eq!(full.begin(), line.begin());
        assert!(full.end() == chars.len() || chars[full.end() - 1] == '\n');
    }

    let lines = buffer.lines(Region::new(0, chars.len())).unwrap();
    let texts: Vec<String> = lines
        .iter()
        .map(|&line| buffer.substr(line).unwrap())
        .collect();
    assert_eq!(texts, text.split('\n').collect::<Vec<_>>());
}
