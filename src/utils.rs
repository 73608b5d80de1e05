/// Row-major table of LCS prefix lengths.
pub struct DPMatrix {
    n_cols: usize,
    data: Vec<u32>,
}

impl DPMatrix {
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            data: vec![0; n_rows * n_cols],
            n_cols,
        }
    }
    pub fn at(&self, i: usize, j: usize) -> u32 {
        self.data[i * self.n_cols + j]
    }
    pub fn set(&mut self, i: usize, j: usize, val: u32) {
        self.data[i * self.n_cols + j] = val;
    }
}

/// A document reduced to its normalized word tokens.
pub struct Sequence {
    pub word_vector: Vec<String>,
    pub n_words: usize,
}

impl Sequence {
    pub fn new(text: &str) -> Self {
        let word_vec = tokenize(text);
        let word_vec_len = word_vec.len();
        Sequence {
            word_vector: word_vec,
            n_words: word_vec_len,
        }
    }
}

/// Lower-cases `text` and keeps the maximal alphanumeric runs as tokens.
/// Separators at the edges or in a row never yield empty tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when the text has nothing but whitespace in it.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
