#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Fuzz TOML parsing of Config: parse and validation errors are fine,
    // panics are not.
    let parsed = toml::from_str::<eload_config::Config>(data);
    match parsed {
        Ok(cfg) => {
            let _ = cfg.validate();
        }
        Err(_e) => {
            // parse error is acceptable
        }
    }
});
