use std::borrow::Cow;

use libafl::{
    Error,
    corpus::CorpusId,
    inputs::BytesInput,
    mutators::{MutationResult, Mutator},
};
use libafl_bolts::Named;

use crate::BigInputMutator;

impl Named for BigInputMutator {
    fn name(&self) -> &Cow<'static, str> {
        &self.name
    }
}

// The same two phases inside a LibAFL mutational stage: the first mutation
// swaps the testcase for the big input, everything after is skipped
impl<S> Mutator<BytesInput, S> for BigInputMutator {
    fn mutate(&mut self, _state: &mut S, input: &mut BytesInput) -> Result<MutationResult, Error> {
        match self.take_turn() {
            Some(big) => {
                *input = BytesInput::new(big.to_vec());
                Ok(MutationResult::Mutated)
            }
            None => Ok(MutationResult::Skipped),
        }
    }

    #[inline]
    fn post_exec(&mut self, _state: &mut S, _new_corpus_id: Option<CorpusId>) -> Result<(), Error> {
        Ok(())
    }
}
