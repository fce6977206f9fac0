#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, u16)| {
    let (expression, page_count) = data;
    let page_count = usize::from(page_count);
    if let Ok(ranges) = pdfsplice::ranges::plan(expression, page_count) {
        assert_eq!(ranges.len(), expression.split(',').count());
        for range in &ranges {
            assert!(range.pages().iter().all(|&p| p >= 1 && p <= page_count));
            assert!(range.pages().windows(2).all(|w| w[1] == w[0] + 1));
        }
    }
});
