#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(root) = xmlobject::from_str(s) {
            let _ = xmlobject::to_string(&root);
            root.release_children_cached_form(true);
            root.release_cached_form(false);
            let _ = xmlobject::to_string(&root);
        }
    }
});
