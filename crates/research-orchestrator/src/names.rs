/// Common TWSE tickers and their company names, used for prompt context and
/// response labelling. Unknown tickers fall back to the raw symbol.
static STOCK_NAMES: &[(&str, &str)] = &[
    ("1301", "台塑"),
    ("1303", "南亞"),
    ("2002", "中鋼"),
    ("2207", "和泰車"),
    ("2301", "光寶科"),
    ("2303", "聯電"),
    ("2308", "台達電"),
    ("2317", "鴻海"),
    ("2327", "國巨"),
    ("2330", "台積電"),
    ("2345", "智邦"),
    ("2357", "華碩"),
    ("2379", "瑞昱"),
    ("2382", "廣達"),
    ("2395", "研華"),
    ("2412", "中華電"),
    ("2454", "聯發科"),
    ("2603", "長榮"),
    ("2609", "陽明"),
    ("2615", "萬海"),
    ("2881", "富邦金"),
    ("2882", "國泰金"),
    ("2884", "玉山金"),
    ("2885", "元大金"),
    ("2886", "兆豐金"),
    ("2891", "中信金"),
    ("3008", "大立光"),
    ("3034", "聯詠"),
    ("3037", "欣興"),
    ("3231", "緯創"),
    ("3443", "創意"),
    ("3661", "世芯KY"),
    ("3711", "日月光"),
    ("4938", "和碩"),
    ("5871", "中租KY"),
    ("6415", "矽力KY"),
    ("6505", "台塑化"),
    ("6669", "緯穎"),
    ("8046", "南電"),
    ("8454", "富邦媒"),
];

pub fn stock_name(ticker: &str) -> &str {
    STOCK_NAMES
        .iter()
        .find(|(id, _)| *id == ticker)
        .map(|(_, name)| *name)
        .unwrap_or(ticker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ticker() {
        assert_eq!(stock_name("2330"), "台積電");
    }

    #[test]
    fn test_unknown_ticker_falls_back_to_symbol() {
        assert_eq!(stock_name("9999"), "9999");
        assert_eq!(stock_name("NVDA"), "NVDA");
    }
}
