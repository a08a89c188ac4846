#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlobject::dom;

fuzz_target!(|data: &[u8]| {
    if let Ok(element) = dom::Reader::new(data).parse() {
        let written = dom::to_string(&element);
        let _ = dom::from_str(&written);
    }
});
