use honggfuzz::fuzz;
use sochi_blocks::Fingerprint;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            if let Ok(text) = std::str::from_utf8(data) {
                if let Ok(fp) = Fingerprint::parse(text) {
                    assert_eq!(Fingerprint::parse(&fp.to_string()).ok(), Some(fp.clone()));
                    if !fp.is_empty() {
                        assert_eq!(fp.similarity(&fp), 1.0);
                    }
                }
            }
        });
    }
}
