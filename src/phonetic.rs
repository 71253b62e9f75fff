//! Radiotelephony spelling of numbers and identifiers for read-backs.

/// ICAO spelling alphabet, indexed by letter
pub const ALPHABET: [&str; 26] = [
    "ALPHA", "BRAVO", "CHARLIE", "DELTA", "ECHO", "FOXTROT", "GOLF", "HOTEL", "INDIA",
    "JULIETT", "KILO", "LIMA", "MIKE", "NOVEMBER", "OSCAR", "PAPA", "QUEBEC", "ROMEO",
    "SIERRA", "TANGO", "UNIFORM", "VICTOR", "WHISKEY", "XRAY", "YANKEE", "ZULU",
];

const DIGITS: [&str; 10] = ["zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine"];

/// Letter for a spelling-alphabet word, accepting the common alternate spellings
pub fn letter_for_word(word: &str) -> Option<char> {
    let word = word.to_ascii_uppercase();
    let word = match word.as_str() {
        "ALFA" => "ALPHA",
        "JULIET" => "JULIETT",
        "X-RAY" => "XRAY",
        other => other,
    };
    ALPHABET
        .iter()
        .position(|w| *w == word)
        .map(|i| (b'A' + i as u8) as char)
}

/// Spoken word for a letter
pub fn word_for_letter(letter: char) -> Option<&'static str> {
    let upper = letter.to_ascii_uppercase();
    upper
        .is_ascii_uppercase()
        .then(|| ALPHABET[(upper as u8 - b'A') as usize])
}

/// Every decimal digit of `text` spoken individually; other characters are skipped
pub fn digits(text: &str) -> String {
    text.chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| DIGITS[d as usize])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Three-digit heading, with north spoken as three six zero
pub fn heading(degrees: f64) -> String {
    let mut whole = degrees.round() as i64 % 360;
    if whole <= 0 {
        whole += 360;
    }
    digits(&format!("{whole:03}"))
}

/// Altitude as a flight level at or above 18,000 ft, otherwise thousands and hundreds
pub fn altitude(feet: f64) -> String {
    let feet = feet.round().max(0.0) as i64;
    if feet >= 18_000 {
        return format!("flight level {}", digits(&(feet / 100).to_string()));
    }

    let thousands = feet / 1000;
    let hundreds = (feet % 1000) / 100;
    let mut parts = Vec::new();
    if thousands > 0 {
        parts.push(format!("{} thousand", digits(&thousands.to_string())));
    }
    if hundreds > 0 {
        parts.push(format!("{} hundred", DIGITS[hundreds as usize]));
    }
    if parts.is_empty() {
        parts.push(DIGITS[0].to_string());
    }
    parts.join(" ")
}

pub fn speed(knots: f64) -> String {
    format!("{} knots", digits(&(knots.round().max(0.0) as i64).to_string()))
}

/// Runway designator such as `28R` as `two eight right`
pub fn runway(id: &str) -> String {
    let mut words = Vec::new();
    for c in id.chars() {
        match c.to_ascii_uppercase() {
            'L' => words.push("left"),
            'R' => words.push("right"),
            'C' => words.push("center"),
            d => {
                if let Some(n) = d.to_digit(10) {
                    words.push(DIGITS[n as usize]);
                }
            }
        }
    }
    words.join(" ")
}

/// Taxiway identifier such as `A3` as `alpha three`
pub fn taxiway(id: &str) -> String {
    id.chars()
        .filter_map(|c| match c.to_digit(10) {
            Some(n) => Some(DIGITS[n as usize].to_string()),
            None => word_for_letter(c).map(str::to_lowercase),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn squawk(code: u16) -> String {
    digits(&format!("{code:04}"))
}
