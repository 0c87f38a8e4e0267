const GATEWAY_TOKEN: &str = "GATEWAY_TOKEN";

pub fn get_gateway_token() -> Option<String> {
    non_empty_var(GATEWAY_TOKEN)
}

const SOURCE_TOKEN: &str = "SOURCE_TOKEN";

pub fn get_source_token() -> Option<String> {
    non_empty_var(SOURCE_TOKEN)
}

const API_TOKEN: &str = "API_TOKEN";

pub fn get_api_token() -> Option<String> {
    non_empty_var(API_TOKEN)
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
