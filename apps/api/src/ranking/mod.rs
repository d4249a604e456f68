// Resume ranking: score every (JD, resume) pair with the LLM, parse the score line, sort.
// All LLM calls go through llm_client.

pub mod handlers;
pub mod prompts;
pub mod ranker;
pub mod render;
pub mod scoring;

#[cfg(test)]
pub(crate) mod test_support;
