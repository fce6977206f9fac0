#![no_main]

use libfuzzer_sys::fuzz_target;

// Parsing must fail cleanly; a parsed document splits into one part per page.
fuzz_target!(|data: &[u8]| {
    let Ok(doc) = pdfsplice::Document::load_mem(data) else {
        return;
    };
    let Ok(pages) = doc.page_count() else {
        return;
    };
    if let Ok(parts) = pdfsplice::split_pages(data) {
        assert_eq!(parts.len(), pages);
    }
});
