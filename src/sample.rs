/// Inputs every routine runs over, in order. Mixed English and Hindi.
pub const SAMPLE_SENTENCES: [&str; 5] = [
    "I really enjoyed this movie, it was fantastic!",
    "मैं आज बहुत खुश हूं",
    "This product is terrible, would not recommend.",
    "बहुत बढ़िया खाना था",
    "The weather is quite pleasant today.",
];
