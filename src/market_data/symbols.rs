// =============================================================================
// Symbol Classification and Crypto Pair Normalization
// =============================================================================
//
// Callers address markets with whatever ticker string their UI happens to
// hold: "AAPL", "spy", "BTC", "ethusdt", "SOL/USD". Everything downstream
// needs a hard split into the two upstream feeds (equities vs. crypto) plus a
// canonical "BASE/USD" pair for the crypto side. Pure string work, no I/O.
// =============================================================================

/// ETFs that must classify as equities even though some (GLD, SLV) look like
/// they could be commodity/crypto tickers.
const STOCK_ETFS: [&str; 6] = ["SPY", "QQQ", "VTI", "IWM", "GLD", "SLV"];

/// Classification result for a caller-supplied symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolClass {
    /// Listed stock or ETF; payload is the uppercased ticker.
    Equity(String),
    /// Crypto market; payload is the normalized `BASE/USD` pair.
    CryptoPair(String),
    /// Matches neither shape. Still routed to the crypto feed verbatim, which
    /// reports it not-found and lets the sentinel fill the response.
    Unrecognized(String),
}

/// True when `symbol` denotes a listed stock or ETF: member of the ETF
/// allow-list, or at most five purely alphabetic characters.
pub fn is_equity_symbol(symbol: &str) -> bool {
    let s = symbol.to_uppercase();
    if STOCK_ETFS.contains(&s.as_str()) {
        return true;
    }
    // US equity tickers are typically <= 5 alpha chars.
    !s.is_empty() && s.len() <= 5 && s.chars().all(|c| c.is_ascii_alphabetic())
}

/// Normalize a crypto ticker to the upstream `BASE/USD` pair form.
///
/// Accepts bare aliases ("BTC", "bitcoin"), joined pairs ("ETHUSD",
/// "btcusdt"), and already-canonical pairs ("SOL/USD"). Returns `None` when
/// the input is not crypto-shaped.
pub fn normalize_crypto_symbol(symbol: &str) -> Option<String> {
    let mut s = symbol.to_uppercase();
    // Callers frequently quote against USDT; the feed only knows USD.
    if let Some(stripped) = s.strip_suffix("USDT") {
        s = format!("{stripped}USD");
    }

    match s.as_str() {
        "BTC" | "BITCOIN" | "BTCUSD" | "BTC/USD" => return Some("BTC/USD".to_string()),
        "ETH" | "ETHEREUM" | "ETHUSD" | "ETH/USD" => return Some("ETH/USD".to_string()),
        _ => {}
    }

    // Generic joined form: ABCUSD -> ABC/USD.
    if s.ends_with("USD") && s.len() <= 7 {
        let base = &s[..s.len() - 3];
        if (2..=5).contains(&base.len()) && base.chars().all(|c| c.is_ascii_alphabetic()) {
            return Some(format!("{base}/USD"));
        }
    }

    // Already canonical.
    if s.contains('/') && s.ends_with("/USD") {
        return Some(s);
    }

    None
}

/// Classify a caller-supplied symbol. Equity wins when a string would satisfy
/// both shapes.
//
// TODO: decide whether Unrecognized should become a 400 instead of riding the
// crypto batch; today unknown shapes are sent upstream verbatim on purpose.
pub fn classify(symbol: &str) -> SymbolClass {
    if is_equity_symbol(symbol) {
        return SymbolClass::Equity(symbol.to_uppercase());
    }
    match normalize_crypto_symbol(symbol) {
        Some(pair) => SymbolClass::CryptoPair(pair),
        None => SymbolClass::Unrecognized(symbol.to_uppercase()),
    }
}

/// Split a request's symbol list into the two upstream batches.
///
/// `equities` holds uppercased tickers; `crypto` holds normalized pairs plus
/// any unrecognized strings verbatim (see [`SymbolClass::Unrecognized`]).
/// Order is preserved, duplicates are kept (the upstream response is keyed,
/// so duplicates collapse there).
pub fn partition_symbols(symbols: &[String]) -> (Vec<String>, Vec<String>) {
    let mut equities = Vec::new();
    let mut crypto = Vec::new();
    for symbol in symbols {
        match classify(symbol) {
            SymbolClass::Equity(ticker) => equities.push(ticker),
            SymbolClass::CryptoPair(pair) => crypto.push(pair),
            SymbolClass::Unrecognized(raw) => crypto.push(raw),
        }
    }
    (equities, crypto)
}

/// The key under which upstream data for `symbol` comes back: the uppercased
/// ticker for equities, the normalized pair for crypto, the uppercased
/// original for everything else.
pub fn upstream_key(symbol: &str) -> String {
    match classify(symbol) {
        SymbolClass::Equity(ticker) => ticker,
        SymbolClass::CryptoPair(pair) => pair,
        SymbolClass::Unrecognized(raw) => raw,
    }
}

// =============================================================================
// Tests
// =============================================================================
