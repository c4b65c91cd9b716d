//! Fuzz target: `sequences.json` parser
//!
//! Verifies that for any input:
//! - No panics under arbitrary input
//! - Every pattern in the resulting library expands to a non-empty
//!   timeline that fits the strike buffer
//!
//! cargo fuzz run fuzz_sequence_document

#![no_main]

use libfuzzer_sys::fuzz_target;

use belltower::tower::sequence::{
    NamedPattern, SequenceLibrary, expand, parse_sequence_document,
};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(doc) = parse_sequence_document(text) else {
        return;
    };
    let library = SequenceLibrary::from_document(&doc);
    for pattern in NamedPattern::ALL {
        let timeline = expand(library.get(pattern)).expect("library patterns always expand");
        assert!(!timeline.is_empty());
    }
});
