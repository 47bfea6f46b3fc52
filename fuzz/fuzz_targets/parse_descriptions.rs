#![no_main]

use libfuzzer_sys::fuzz_target;
use nanoutils::{mapping::DType, utils::VersionInfo};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(dtype) = DType::parse(text) {
            let _ = dtype.itemsize();
            let _ = DType::parse(&dtype.str());
        }
        let _ = VersionInfo::parse(text, true);
        let _ = VersionInfo::parse(text, false);
    }
});
