use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use realzen_agent_model::{
    ModelMessage, ModelRequest, ToolCallRequest, ToolCallResult,
};

use super::Agent;
use crate::conversation::{Conversation, Item, TranscriptSource};
use crate::error::Error;
use crate::model_client::ModelClientResponse;

#[derive(Debug)]
enum AgentStage {
    InvokingModel,
    InvokingTools(Vec<ToolCallRequest>),
    Done,
}

pub(super) async fn run(
    agent: &Agent,
    conversation: Conversation,
) -> Result<Conversation, Error> {
    let mut run = Run {
        agent,
        conversation,
        turns: 0,
    };
    let mut stage = AgentStage::InvokingModel;
    loop {
        stage = match stage {
            AgentStage::InvokingModel => run.invoke_model().await?,
            AgentStage::InvokingTools(requests) => {
                run.invoke_tools(requests).await?
            }
            AgentStage::Done => {
                debug!("done after {} turns", run.turns);
                return Ok(run.conversation);
            }
        };
        trace!("next stage: {stage:?}");
    }
}

struct Run<'a> {
    agent: &'a Agent,
    conversation: Conversation,
    turns: usize,
}

impl Run<'_> {
    async fn invoke_model(&mut self) -> Result<AgentStage, Error> {
        self.turns += 1;
        let request = self.build_model_request(Utc::now());
        let resp = self
            .agent
            .model_client
            .send_request(request)
            .await
            .map_err(Error::ModelInvocation)?;
        let resp = resp.validate().map_err(|reason| {
            warn!("malformed model output: {reason}");
            Error::MalformedModelOutput(reason)
        })?;

        let ModelClientResponse {
            transcript,
            opaque_msg,
            tool_calls,
            ..
        } = resp;
        let msg = match opaque_msg {
            Some(opaque_msg) => ModelMessage::Opaque(opaque_msg),
            // Downgrade to a text-only message.
            None => ModelMessage::Assistant(transcript.clone()),
        };
        if !transcript.is_empty() {
            self.agent
                .emit_transcript(&transcript, TranscriptSource::Assistant);
        }
        self.conversation.push(Item {
            msg,
            transcript,
            source: TranscriptSource::Assistant,
            tool_calls: tool_calls.clone(),
        });

        if tool_calls.is_empty() {
            return Ok(AgentStage::Done);
        }
        if self.turns >= self.agent.max_turns {
            warn!("giving up after {} turns", self.turns);
            return Err(Error::MaxTurnsExceeded(self.agent.max_turns));
        }
        Ok(AgentStage::InvokingTools(tool_calls))
    }

    async fn invoke_tools(
        &mut self,
        requests: Vec<ToolCallRequest>,
    ) -> Result<AgentStage, Error> {
        debug!("running {} tool calls", requests.len());
        let futures: Vec<_> = requests
            .iter()
            .map(|req| self.agent.tools.dispatch(req))
            .collect();
        // Results come back in request order, whatever order they finish in.
        let results = join_all(futures).await;

        for (req, result) in requests.into_iter().zip(results) {
            let content = match result {
                Ok(content) => content,
                Err(err) if err.is_fatal() => {
                    error!("tool `{}` failed: {err}", req.name);
                    return Err(Error::Tool {
                        name: req.name,
                        source: err,
                    });
                }
                Err(err) => {
                    warn!("tool `{}` rejected the call: {err}", req.name);
                    format!("Error: {err}")
                }
            };
            self.agent.emit_transcript(&content, TranscriptSource::Tool);
            self.conversation.push(Item {
                msg: ModelMessage::Tool(ToolCallResult::new(
                    req.id,
                    content.clone(),
                )),
                transcript: content,
                source: TranscriptSource::Tool,
                tool_calls: vec![],
            });
        }
        Ok(AgentStage::InvokingModel)
    }

    fn build_model_request(&self, now: DateTime<Utc>) -> ModelRequest {
        let mut messages = Vec::with_capacity(self.conversation.len() + 1);
        if let Some(prompt) = &self.agent.system_prompt {
            messages.push(ModelMessage::System(render_system_prompt(prompt, now)));
        }
        messages.extend(self.conversation.messages().cloned());
        ModelRequest {
            messages,
            tools: self.agent.tools.definitions().to_vec(),
        }
    }
}

fn render_system_prompt(prompt: &str, now: DateTime<Utc>) -> String {
    prompt.replace("{system_time}", &now.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_render_system_prompt() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        assert_eq!(
            render_system_prompt("Be brief.\n\nSystem time: {system_time}", now),
            "Be brief.\n\nSystem time: 2024-06-01T12:30:00+00:00"
        );
        assert_eq!(render_system_prompt("No placeholder", now), "No placeholder");
    }
}
