use std::sync::Arc;

use crate::rpc::AccountRpc;
use crate::validation::ValidatorRegistry;

/// Shared handler state: the account service client and the validator
/// registry, both built once at startup.
#[derive(Clone)]
pub struct AccountGateway {
    rpc: Arc<dyn AccountRpc>,
    validators: Arc<ValidatorRegistry>,
}

impl AccountGateway {
    /// Gateway with the default rule set.
    pub fn new(rpc: Arc<dyn AccountRpc>) -> Self {
        let validators = ValidatorRegistry::new(rpc.clone());
        Self::with_validators(rpc, validators)
    }

    pub fn with_validators(rpc: Arc<dyn AccountRpc>, validators: ValidatorRegistry) -> Self {
        Self {
            rpc,
            validators: Arc::new(validators),
        }
    }

    pub fn rpc(&self) -> &dyn AccountRpc {
        self.rpc.as_ref()
    }

    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }
}

impl std::fmt::Debug for AccountGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountGateway")
            .field("validators", &self.validators)
            .finish_non_exhaustive()
    }
}
