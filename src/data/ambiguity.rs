//! Observed state codes and the states they stand for.

/// Code of an observed (possibly ambiguous) state at one tip and pattern.
pub type StateCode = u8;

// =#========================================================================#=
// AMBIGUITY TABLE
// =#========================================================================#=
/// Lookup table listing the primary states each state code expands to.
///
/// Codes `0..num_states` are the primary states themselves; further codes
/// are ambiguities. The last code always means "any state" (missing data,
/// gaps).
///
/// # Example
/// ```
/// use phylik::data::AmbiguityTable;
///
/// let dna = AmbiguityTable::dna();
/// let r = dna.code_for('R').unwrap();
/// assert_eq!(dna.states(r), &[0, 2]); // A or G
/// assert_eq!(dna.states(dna.code_for('-').unwrap()).len(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AmbiguityTable {
    num_states: usize,
    symbols: Vec<char>,
    expansions: Vec<Vec<usize>>,
}

impl AmbiguityTable {
    /// Creates the nucleotide table with the IUPAC ambiguity codes.
    ///
    /// `U` reads as `T`; `N`, `X`, `?` and `-` read as "any state".
    pub fn dna() -> Self {
        // A=0, C=1, G=2, T=3
        let entries: [(char, &[usize]); 15] = [
            ('A', &[0]),
            ('C', &[1]),
            ('G', &[2]),
            ('T', &[3]),
            ('R', &[0, 2]),
            ('Y', &[1, 3]),
            ('M', &[0, 1]),
            ('K', &[2, 3]),
            ('S', &[1, 2]),
            ('W', &[0, 3]),
            ('H', &[0, 1, 3]),
            ('B', &[1, 2, 3]),
            ('V', &[0, 1, 2]),
            ('D', &[0, 2, 3]),
            ('N', &[0, 1, 2, 3]),
        ];
        AmbiguityTable {
            num_states: 4,
            symbols: entries.iter().map(|(symbol, _)| *symbol).collect(),
            expansions: entries.iter().map(|(_, states)| states.to_vec()).collect(),
        }
    }

    /// Creates a table without ambiguities for `num_states` primary states,
    /// plus the final "any state" code.
    ///
    /// # Panics
    /// Panics if `num_states` is zero or does not leave room for the extra code.
    pub fn unambiguous(num_states: usize) -> Self {
        assert!(num_states > 0, "Need at least one state");
        assert!(num_states < StateCode::MAX as usize, "Too many states: {num_states}");
        let mut expansions: Vec<Vec<usize>> = (0..num_states).map(|s| vec![s]).collect();
        expansions.push((0..num_states).collect());
        let symbols = (0..num_states)
            .map(|s| char::from_digit(s as u32, 36).unwrap_or('*'))
            .chain(std::iter::once('?'))
            .collect();
        AmbiguityTable { num_states, symbols, expansions }
    }

    /// Returns the number of primary states.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Returns the number of codes, primary states included.
    pub fn num_codes(&self) -> usize {
        self.expansions.len()
    }

    /// Returns the code meaning "any state".
    pub fn missing_code(&self) -> StateCode {
        (self.expansions.len() - 1) as StateCode
    }

    /// Returns the primary states `code` expands to.
    ///
    /// # Panics
    /// Panics if `code` is not a valid code of this table.
    pub fn states(&self, code: StateCode) -> &[usize] {
        &self.expansions[code as usize]
    }

    /// Returns `true` if `code` expands to more than one state.
    pub fn is_ambiguous(&self, code: StateCode) -> bool {
        self.states(code).len() > 1
    }

    /// Translates an alignment symbol (case-insensitive) into a code.
    pub fn code_for(&self, symbol: char) -> Option<StateCode> {
        let symbol = match symbol.to_ascii_uppercase() {
            'U' if self.num_states == 4 => 'T',
            '-' | '?' | 'X' if self.num_states == 4 => 'N',
            '-' | '?' => return Some(self.missing_code()),
            other => other,
        };
        self.symbols.iter().position(|&s| s == symbol).map(|i| i as StateCode)
    }

    /// Returns the symbol for `code`.
    pub fn symbol(&self, code: StateCode) -> char {
        self.symbols[code as usize]
    }
}
