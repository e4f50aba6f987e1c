//! Four-step bouquet builder: pick flowers, customize, write the card, share.
//!
//! The wizard owns its [`BouquetDraft`]; each step may only touch the parts
//! of the draft it is responsible for.

use shared::{
    domain::{FlowerId, Letter},
    draft::BouquetDraft,
    protocol::{CreateBouquetRequest, CreateBouquetResponse},
    selection::{AddOutcome, RemoveOutcome, MIN_FLOWERS},
};
use thiserror::Error;
use tracing::info;

use crate::{BouquetClient, ClientError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    PickFlowers,
    Customize,
    WriteCard,
    Share,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::PickFlowers,
        WizardStep::Customize,
        WizardStep::WriteCard,
        WizardStep::Share,
    ];

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::PickFlowers => "Pick Flowers",
            WizardStep::Customize => "Customize Bouquet",
            WizardStep::WriteCard => "Write Card",
            WizardStep::Share => "Share",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("{action} is only available on the {expected:?} step (currently {actual:?})")]
    WrongStep {
        action: &'static str,
        expected: WizardStep,
        actual: WizardStep,
    },
    #[error("pick at least {need} flowers (have {have})")]
    NotEnoughFlowers { have: u32, need: u32 },
    #[error("already on the last step")]
    AtLastStep,
    #[error("too many flowers: a bouquet can hold at most 10")]
    TooManyFlowers,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug, Clone)]
pub struct Wizard {
    step: WizardStep,
    draft: BouquetDraft,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new(BouquetDraft::default())
    }
}

impl Wizard {
    pub fn new(draft: BouquetDraft) -> Self {
        Self {
            step: WizardStep::PickFlowers,
            draft,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &BouquetDraft {
        &self.draft
    }

    pub fn into_draft(self) -> BouquetDraft {
        self.draft
    }

    pub fn can_proceed(&self) -> bool {
        match self.step {
            WizardStep::PickFlowers => self.draft.selection.meets_minimum(),
            WizardStep::Customize | WizardStep::WriteCard => true,
            WizardStep::Share => false,
        }
    }

    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        if self.step == WizardStep::Share {
            return Err(WizardError::AtLastStep);
        }
        if !self.can_proceed() {
            return Err(WizardError::NotEnoughFlowers {
                have: self.draft.selection.total(),
                need: MIN_FLOWERS,
            });
        }
        self.step = WizardStep::ALL[self.step.index() + 1];
        Ok(self.step)
    }

    /// Moves back one step; stays put on the first one.
    pub fn back(&mut self) -> WizardStep {
        self.step = WizardStep::ALL[self.step.index().saturating_sub(1)];
        self.step
    }

    pub fn add_flower(&mut self, id: FlowerId) -> Result<u32, WizardError> {
        self.require(WizardStep::PickFlowers, "adding flowers")?;
        match self.draft.add_flower(id) {
            AddOutcome::Added { count } => Ok(count),
            AddOutcome::TooMany => Err(WizardError::TooManyFlowers),
        }
    }

    pub fn remove_flower(&mut self, id: FlowerId) -> Result<RemoveOutcome, WizardError> {
        self.require(WizardStep::PickFlowers, "removing flowers")?;
        Ok(self.draft.remove_flower(id))
    }

    pub fn shuffle(&mut self) -> Result<Vec<usize>, WizardError> {
        self.require(WizardStep::Customize, "shuffling")?;
        Ok(self.draft.shuffle().to_vec())
    }

    pub fn shuffle_seeded(&mut self, seed: u64) -> Result<Vec<usize>, WizardError> {
        self.require(WizardStep::Customize, "shuffling")?;
        Ok(self.draft.shuffle_seeded(seed).to_vec())
    }

    pub fn set_greenery(&mut self, greenery: u32) -> Result<(), WizardError> {
        self.require(WizardStep::Customize, "choosing greenery")?;
        self.draft.greenery = greenery;
        Ok(())
    }

    pub fn set_letter(&mut self, letter: Letter) -> Result<(), WizardError> {
        self.require(WizardStep::WriteCard, "writing the card")?;
        self.draft.letter = letter;
        Ok(())
    }

    pub fn request(&self) -> Result<CreateBouquetRequest, WizardError> {
        self.require(WizardStep::Share, "publishing")?;
        Ok(self.draft.clone().into_request())
    }

    /// Sends the draft once. On failure the wizard is untouched, so calling
    /// this again is the retry.
    pub async fn publish(
        &self,
        client: &BouquetClient,
    ) -> Result<CreateBouquetResponse, PublishError> {
        let request = self.request()?;
        let created = client.create_bouquet(&request).await?;
        info!(short_id = %created.short_id, url = %created.share.url, "bouquet ready to share");
        Ok(created)
    }

    fn require(&self, expected: WizardStep, action: &'static str) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                action,
                expected,
                actual: self.step,
            })
        }
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
