/// Split text into index terms.
///
/// ASCII alphanumeric runs become lowercase words; words of one character
/// are dropped. Runs of other alphanumeric characters (kanji, kana,
/// full-width forms) carry no word boundaries, so they are indexed as
/// overlapping character bigrams, or as a single unigram when the run is one
/// character long. Everything else separates runs.
pub fn analyze(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut ascii = String::new();
    let mut wide: Vec<char> = Vec::new();

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            flush_wide(&mut wide, &mut terms);
            ascii.push(c.to_ascii_lowercase());
        } else if c.is_alphanumeric() {
            flush_ascii(&mut ascii, &mut terms);
            wide.push(c);
        } else {
            flush_ascii(&mut ascii, &mut terms);
            flush_wide(&mut wide, &mut terms);
        }
    }
    flush_ascii(&mut ascii, &mut terms);
    flush_wide(&mut wide, &mut terms);

    terms
}

fn flush_ascii(run: &mut String, terms: &mut Vec<String>) {
    if run.len() > 1 {
        terms.push(std::mem::take(run));
    } else {
        run.clear();
    }
}

fn flush_wide(run: &mut Vec<char>, terms: &mut Vec<String>) {
    match run.len() {
        0 => {}
        1 => terms.push(run[0].to_string()),
        _ => terms.extend(run.windows(2).map(|w| w.iter().collect::<String>())),
    }
    run.clear();
}
