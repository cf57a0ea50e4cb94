use serde::Deserialize;

/// A single post fetched from the feed (provider-agnostic).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: u64,
    pub author: String,
    pub raw_text: String,
}

/// Which posts to fetch. Fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    pub query: String,
    pub lang: String,
    pub result_type: String,
    pub count: u32,
}

impl SearchFilter {
    pub fn from_config(config: &crate::config::FeedConfig) -> Self {
        Self {
            query: config.query.clone(),
            lang: config.lang.clone(),
            result_type: config.result_type.clone(),
            count: config.count,
        }
    }

    /// Query parameters for a search newer than `since_id`. `since_id == 0` means no bound.
    pub fn query_params(&self, since_id: u64) -> Vec<(String, String)> {
        let mut params = vec![
            ("q".to_string(), self.query.clone()),
            ("lang".to_string(), self.lang.clone()),
            ("result_type".to_string(), self.result_type.clone()),
            ("count".to_string(), self.count.to_string()),
        ];
        if since_id > 0 {
            params.push(("since_id".to_string(), since_id.to_string()));
        }
        params
    }
}

/// v1.1 `search/tweets.json` response.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub statuses: Vec<Status>,
}

#[derive(Debug, Deserialize)]
pub struct Status {
    pub id: u64,
    #[serde(default, alias = "full_text")]
    pub text: String,
    pub user: StatusUser,
}

#[derive(Debug, Deserialize)]
pub struct StatusUser {
    pub screen_name: String,
}

impl From<Status> for Post {
    fn from(status: Status) -> Self {
        Post {
            id: status.id,
            author: status.user.screen_name,
            raw_text: status.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_into_posts() {
        let body = r#"{
            "statuses": [
                {"id": 1850000000000000001, "text": "Nytt om #svpol", "user": {"screen_name": "anna"}, "lang": "sv"},
                {"id": 1850000000000000000, "full_text": "Äldre\ninlägg", "user": {"screen_name": "erik"}}
            ],
            "search_metadata": {"count": 20}
        }"#;
        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let posts: Vec<Post> = parsed.statuses.into_iter().map(Post::from).collect();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, 1850000000000000001);
        assert_eq!(posts[0].author, "anna");
        assert_eq!(posts[1].raw_text, "Äldre\ninlägg");
    }

    #[test]
    fn test_missing_statuses_is_empty() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.statuses.is_empty());
    }

    #[test]
    fn test_query_params_omit_zero_since_id() {
        let filter = SearchFilter::from_config(&crate::config::FeedConfig::default());
        let params = filter.query_params(0);
        assert!(params.iter().all(|(k, _)| k != "since_id"));
        assert!(params.contains(&("q".to_string(), "#svpol -rt".to_string())));

        let params = filter.query_params(42);
        assert!(params.contains(&("since_id".to_string(), "42".to_string())));
    }
}
