use scout_core::Candidate;

pub(crate) const EVALUATE_SYSTEM_PROMPT: &str = "You are a market analyst for low-cost digital products \
(templates, planners, guides, toolkits). Judge whether a niche is worth creating a product for now. \
Reply with one JSON object and nothing else: \
{\"decision\": \"create\" | \"monitor\" | \"skip\", \"confidence\": number between 0 and 1, \
\"reasoning\": string, \"estimated_price\": number in USD, \"differentiator\": string, \
\"product_type\": string}.";

pub(crate) const GENERATE_SYSTEM_PROMPT: &str = "You write concise, practical digital products. \
Reply with one JSON object and nothing else: \
{\"title\": string, \"subtitle\": string, \"author\": string, \
\"sections\": [{\"heading\": string, \"body\": string}]}. \
Write between 4 and 8 sections; bodies are plain text or markdown.";

pub(crate) fn evaluate_prompt(candidate: &Candidate, context_summary: &str) -> String {
    let mut prompt = format!("Niche: {}\n", candidate.keyword);
    if !candidate.category.is_empty() {
        prompt.push_str(&format!("Category: {}\n", candidate.category));
    }
    if let Some(volume) = candidate.search_volume {
        prompt.push_str(&format!("Estimated monthly searches: {volume}\n"));
    }
    prompt.push_str(&format!("Competition: {}\n", candidate.competition));
    if !context_summary.trim().is_empty() {
        prompt.push_str("\nHistory:\n");
        prompt.push_str(context_summary.trim());
        prompt.push('\n');
    }
    prompt
}

pub(crate) fn generate_prompt(trend: &str, pricing_hint: Option<f64>) -> String {
    let mut prompt = format!("Create a digital product for the niche: {trend}\n");
    if let Some(price) = pricing_hint {
        prompt.push_str(&format!(
            "It will sell for about ${price:.2}; match the depth to that price.\n"
        ));
    }
    prompt
}
