#![no_main]

use libfuzzer_sys::fuzz_target;
use yarrow::ast::Model;
use yarrow::frontend::loader;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let mut model = Model::new();
        if loader::load_str(&mut model, "Fuzz", "fuzz.yml", s).is_ok() {
            let _ = yarrow::validate(model);
        }
    }
});
