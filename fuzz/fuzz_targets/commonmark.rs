#![no_main]

use annotext::CommonMarkSource;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);
    let Ok(doc) = CommonMarkSource::parse(&input) else {
        return;
    };
    let Ok(rendered) = doc.to_commonmark() else {
        return;
    };
    let reparsed = CommonMarkSource::parse(&rendered).expect("rendered markdown parses");
    assert!(
        doc.structurally_eq(&reparsed).unwrap_or(false),
        "round trip changed structure\n--- input\n{input}\n--- rendered\n{rendered}"
    );
});
