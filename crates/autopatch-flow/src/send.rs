use autopatch_core::Status;
use autopatch_git::Mail;

use crate::machine::Machine;
use crate::prompt::Choice;
use crate::state::{Payload, State, Transition};
use crate::FlowError;

const TARGET_MAINLINE: &str = "mainline";
const TARGET_TEST: &str = "test";

impl Machine<'_> {
    pub(crate) fn select_send(&mut self, payload: Payload) -> Result<Transition, FlowError> {
        let patches = payload.into_patches(State::SelectSend)?;
        let choices = [
            Choice::new(TARGET_MAINLINE, "Send to the maintainers and lists"),
            Choice::new(TARGET_TEST, "Send to my test address"),
        ];
        let target = self.gw.prompt.menu("Where should the patch go?", &choices)?;
        match target.as_deref() {
            Some(TARGET_MAINLINE) => Ok(Transition::with(State::SelectMt, Payload::Patches(patches))),
            Some(TARGET_TEST) => Ok(Transition::with(State::SendTest, Payload::Patches(patches))),
            _ => Ok(Transition::pause(Status::ReCommit)),
        }
    }

    pub(crate) fn select_mt(&mut self, payload: Payload) -> Result<Transition, FlowError> {
        let patches = payload.into_patches(State::SelectMt)?;
        let maintainers = self.gw.vcs.maintainers(&patches)?;
        if maintainers.is_empty() {
            self.gw.prompt.notice("no maintainers found for these patches");
            return Ok(Transition::pause(Status::ReCommit));
        }

        let choices: Vec<Choice> = maintainers
            .iter()
            .map(|m| Choice::new(&m.email, &m.name))
            .collect();
        let Some(to) = self.gw.prompt.checklist("Select To: recipients", &choices)? else {
            self.gw.prompt.notice("no To: recipients selected");
            return Ok(Transition::pause(Status::ReCommit));
        };

        let choices: Vec<Choice> = maintainers
            .iter()
            .filter(|m| !to.contains(&m.email))
            .map(|m| Choice::new(&m.email, &m.name).selected(true))
            .collect();
        let Some(cc) = self.gw.prompt.checklist("Select Cc: recipients", &choices)? else {
            self.gw.prompt.notice("no Cc: recipients selected");
            return Ok(Transition::pause(Status::ReCommit));
        };

        Ok(Transition::with(State::SendEmail, Payload::Mail { patches, to, cc }))
    }

    pub(crate) fn send_test(&mut self, payload: Payload) -> Result<Transition, FlowError> {
        let patches = payload.into_patches(State::SendTest)?;
        let address = match self.workspace.test_email() {
            Some(address) => address.to_string(),
            None => {
                let answer = self
                    .gw
                    .prompt
                    .input("Test address to send patches to", "")?
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty());
                let Some(address) = answer else {
                    return Ok(Transition::pause(Status::ReCommit));
                };
                self.workspace.set_test_email(&address);
                self.workspace.flush()?;
                address
            }
        };
        Ok(Transition::with(
            State::SendEmail,
            Payload::Mail {
                patches,
                to: vec![address.clone()],
                cc: vec![address],
            },
        ))
    }

    pub(crate) fn send_email(&mut self, payload: Payload) -> Result<Transition, FlowError> {
        let Payload::Mail { patches, to, cc } = payload else {
            return Err(FlowError::UnexpectedPayload {
                state: State::SendEmail,
                expected: "mail",
            });
        };
        let mail = Mail {
            from: self.gw.vcs.sender()?,
            to,
            cc,
            patches,
        };
        if !self.gw.mailer.send(&mail)? {
            tracing::warn!("send-email failed");
            return Ok(Transition::pause(Status::ReCommit));
        }
        Ok(Transition::to(State::Finish))
    }

    pub(crate) fn finish(&mut self, _: Payload) -> Result<Transition, FlowError> {
        if let Some(group) = self.group {
            let count = self.workspace.registry_mut().finish_group(group);
            tracing::info!(group, count, "series finished");
        }
        Ok(Transition::pause(Status::Finish))
    }
}
