use research_core::{InstitutionalFlow, NewsItem, StockSnapshot};

/// Assemble the research prompt from whatever data survived fetching.
/// Missing sections are simply omitted; the model is told to work with what
/// it has.
pub fn build_research_prompt(
    ticker: &str,
    name: &str,
    date_str: &str,
    snapshot: Option<&StockSnapshot>,
    flow: Option<&InstitutionalFlow>,
    news: &[NewsItem],
) -> String {
    let mut data_summary = String::new();
    if let Some(s) = snapshot {
        data_summary = format!(
            "- {} ({}): 價格 {}, 漲跌 {} ({}%), 成交量 {}",
            s.symbol, name, s.price, s.change, s.pct_change, s.volume
        );
        if let Some(ma5) = s.ma5 {
            data_summary.push_str(&format!(", MA5={}", ma5));
        }
        if let Some(ma20) = s.ma20 {
            data_summary.push_str(&format!(", MA20={}", ma20));
        }
        if let Some(rsi) = s.rsi {
            data_summary.push_str(&format!(", RSI={}", rsi));
        }
    }

    let mut inst_summary = String::new();
    if let Some(f) = flow {
        inst_summary = format!(
            "此股三大法人動態：外資 {:+}, 投信 {:+}, 合計 {:+}",
            f.foreign_net, f.trust_net, f.total_net
        );
    }

    let mut news_summary = String::new();
    for item in news.iter().take(10) {
        news_summary.push_str(&format!("- {} ({})\n", item.title, item.url));
    }

    format!(
        "You are a professional financial analyst specializing in the Taiwan stock market.\n\
         Create a comprehensive deep research report for stock {ticker} ({name}) as of {date_str}.\n\
         Write in Traditional Chinese (繁體中文) Markdown format.\n\
         \n\
         # 股票數據\n\
         {data_summary}\n\
         {inst_summary}\n\
         \n\
         # 相關新聞\n\
         {news_summary}\n\
         # 報告要求（請嚴格按照以下結構）\n\
         ## 1. 公司基本資料\n\
         ## 2. 股價技術面快照（表格：價格、漲跌、漲跌幅、MA5、MA20、RSI；均線排列；RSI 超買/超賣判斷）\n\
         ## 3. 營收與獲利分析\n\
         ## 4. 成長引擎分析（至少 2~3 個成長動能，附具體數據）\n\
         ## 5. 盤面歸因分析（「結果 ← 原因」格式，宏觀/產業/籌碼各至少 1 項）\n\
         ## 6. 風險評估（3~5 項，短期 vs 長期）\n\
         ## 7. 投資結論（偏多/中性/偏空，建議觀察重點）\n\
         \n\
         若某些數據缺失，請以現有資料撰寫並註明。請生成完整、專業的深度研究報告。\n"
    )
}
