use regex::Regex;

pub struct Extractor {
    phone_regex: Regex,
}

impl Extractor {
    pub fn new() -> Self {
        Extractor {
            // NANP numbers, optional +1 / 1 prefix: (860) 555-0144, 860-555-0144, 8605550144
            phone_regex: Regex::new(r"(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}")
                .unwrap(),
        }
    }

    /// First phone-shaped token in the text, or None. Guards on digit
    /// count so ZIP+street-number runs don't qualify.
    pub fn extract_phone(&self, text: &str) -> Option<String> {
        for cap in self.phone_regex.find_iter(text) {
            let candidate = cap.as_str().trim().to_string();
            let digits: String = candidate.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() == 10 || digits.len() == 11 {
                return Some(candidate);
            }
        }
        None
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new()
    }
}
