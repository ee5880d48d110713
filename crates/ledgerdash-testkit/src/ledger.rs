//! In-memory ledger simulator
//!
//! [`InMemoryLedger`] implements [`LedgerClient`] over a small model of the
//! asset and whitelist package: owned objects, a whitelist collection, gas
//! balances, and administrative capabilities. Writes follow the package's
//! rules (admin-only whitelist edits, owner-only removal, paid mints checked
//! against the mint price) and charge a fixed gas fee.
//!
//! Tests can inject faults per operation, force the next execution to abort,
//! count calls, and park calls behind a [`Gate`].

use crate::gate::Gate;
use async_trait::async_trait;
use ledgerdash_app::config::MODULE_NAME;
use ledgerdash_app::reader::MEMBERSHIP_FUNCTION;
use ledgerdash_app::{
    canonical_type_tag, Address, AppConfig, CallArg, DynamicField, ExecutionStatus, InspectResults, LedgerClient,
    LedgerError, MoveCall, ObjectChange, ObjectId, OwnedObject, TransactionOutcome,
    TransactionRequest,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

/// Gas charged for every executed transaction (MIST).
pub const SIMULATED_GAS_FEE: u64 = 1_000_000;

/// Ledger operations, for fault injection, call counting, and gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerOp {
    /// `get_owned_objects`
    OwnedObjects,
    /// `get_dynamic_fields`
    DynamicFields,
    /// `dev_inspect`
    DevInspect,
    /// `get_balance`
    Balance,
    /// `execute`
    Execute,
}

#[derive(Debug, Clone)]
struct StoredObject {
    owner: Address,
    type_tag: String,
    fields: Value,
}

impl StoredObject {
    /// Type match that ignores how wide the package address is written.
    fn is_of_type(&self, type_tag: &str) -> bool {
        canonical_type_tag(&self.type_tag) == canonical_type_tag(type_tag)
    }
}

#[derive(Debug, Default)]
struct ChainState {
    objects: BTreeMap<ObjectId, StoredObject>,
    whitelist: Vec<Address>,
    balances: HashMap<Address, u64>,
    next_object: u64,
    next_digest: u64,
    executed: Vec<TransactionRequest>,
    calls: HashMap<LedgerOp, u64>,
    faults: HashMap<LedgerOp, VecDeque<LedgerError>>,
    abort_next: Option<String>,
}

impl ChainState {
    fn mint_object_id(&mut self) -> ObjectId {
        self.next_object += 1;
        let mut bytes = [0u8; 32];
        bytes[0] = 0xa5;
        bytes[24..].copy_from_slice(&self.next_object.to_be_bytes());
        ObjectId::from_bytes(bytes)
    }

    fn digest(&mut self) -> String {
        self.next_digest += 1;
        hex::encode(self.next_digest.to_be_bytes())
    }

    fn owns_type(&self, owner: &Address, type_tag: &str) -> bool {
        self.objects
            .values()
            .any(|o| &o.owner == owner && o.is_of_type(type_tag))
    }
}

struct GateEntry {
    op: LedgerOp,
    owner: Option<Address>,
    gate: Arc<Gate>,
}

/// In-memory [`LedgerClient`].
pub struct InMemoryLedger {
    package_id: ObjectId,
    whitelist_id: ObjectId,
    asset_type: String,
    capability_type: String,
    mint_price: u64,
    state: Mutex<ChainState>,
    gates: Mutex<Vec<GateEntry>>,
}

impl InMemoryLedger {
    /// Create an empty ledger hosting the package named in `config`.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            package_id: config.package_id.clone(),
            whitelist_id: config.whitelist_id.clone(),
            asset_type: config.asset_type(),
            capability_type: config.capability_type(),
            mint_price: config.mint_price,
            state: Mutex::new(ChainState::default()),
            gates: Mutex::new(Vec::new()),
        }
    }

    // =========================================================================
    // Seeding and Inspection
    // =========================================================================

    /// Set the gas balance of `owner`.
    pub fn fund(&self, owner: &Address, mist: u64) {
        self.state.lock().balances.insert(owner.clone(), mist);
    }

    /// Current gas balance of `owner`.
    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.state.lock().balances.get(owner).copied().unwrap_or(0)
    }

    /// Give `owner` an administrative capability.
    pub fn grant_admin(&self, owner: &Address) -> ObjectId {
        let type_tag = self.capability_type.clone();
        self.seed_object(owner, &type_tag, json!({}))
    }

    /// Put `member` on the whitelist.
    pub fn whitelist(&self, member: &Address) {
        let mut state = self.state.lock();
        if !state.whitelist.contains(member) {
            state.whitelist.push(member.clone());
        }
    }

    /// Whether `member` is on the whitelist.
    pub fn is_whitelisted(&self, member: &Address) -> bool {
        self.state.lock().whitelist.contains(member)
    }

    /// Give `owner` an asset named `name`.
    pub fn seed_asset(&self, owner: &Address, name: &str) -> ObjectId {
        let type_tag = self.asset_type.clone();
        self.seed_object(
            owner,
            &type_tag,
            json!({
                "name": name,
                "description": format!("{name} description"),
                "image_url": format!("https://example.invalid/{name}.png"),
                "traits": [],
            }),
        )
    }

    /// Give `owner` an arbitrary object.
    pub fn seed_object(&self, owner: &Address, type_tag: &str, fields: Value) -> ObjectId {
        let mut state = self.state.lock();
        let id = state.mint_object_id();
        state.objects.insert(
            id.clone(),
            StoredObject {
                owner: owner.clone(),
                type_tag: type_tag.to_string(),
                fields,
            },
        );
        id
    }

    /// Assets owned by `owner`, in identifier order.
    pub fn assets_of(&self, owner: &Address) -> Vec<ObjectId> {
        self.state
            .lock()
            .objects
            .iter()
            .filter(|(_, o)| &o.owner == owner && o.is_of_type(&self.asset_type))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Transactions that reached execution, in order.
    pub fn executed(&self) -> Vec<TransactionRequest> {
        self.state.lock().executed.clone()
    }

    /// Calls made to `op` so far, including failed and gated ones.
    pub fn calls(&self, op: LedgerOp) -> u64 {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    // =========================================================================
    // Fault Injection and Gating
    // =========================================================================

    /// Fail the next call to `op` with `error`. Faults queue in order.
    pub fn fail_next(&self, op: LedgerOp, error: LedgerError) {
        self.state
            .lock()
            .faults
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Abort the next executed transaction on-ledger (gas is still charged).
    pub fn abort_next_execution(&self, reason: impl Into<String>) {
        self.state.lock().abort_next = Some(reason.into());
    }

    /// Park every call to `op` behind a new gate.
    pub fn hold(&self, op: LedgerOp) -> Arc<Gate> {
        self.install_gate(op, None)
    }

    /// Park calls to `op` made on behalf of `owner` behind a new gate.
    pub fn hold_for(&self, op: LedgerOp, owner: &Address) -> Arc<Gate> {
        self.install_gate(op, Some(owner.clone()))
    }

    fn install_gate(&self, op: LedgerOp, owner: Option<Address>) -> Arc<Gate> {
        let gate = Arc::new(Gate::new());
        self.gates.lock().push(GateEntry {
            op,
            owner,
            gate: gate.clone(),
        });
        gate
    }

    async fn enter(&self, op: LedgerOp, owner: Option<&Address>) -> Result<(), LedgerError> {
        *self.state.lock().calls.entry(op).or_default() += 1;

        let gates: Vec<Arc<Gate>> = self
            .gates
            .lock()
            .iter()
            .filter(|g| g.op == op && g.owner.as_ref().map_or(true, |o| Some(o) == owner))
            .map(|g| g.gate.clone())
            .collect();
        for gate in gates {
            gate.pass().await;
        }

        match self.state.lock().faults.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(error) => {
                tracing::debug!(?op, %error, "Injected ledger fault");
                Err(error)
            }
            None => Ok(()),
        }
    }

    // =========================================================================
    // Package Rules
    // =========================================================================

    fn apply_call(
        &self,
        state: &mut ChainState,
        tx: &TransactionRequest,
    ) -> Result<Vec<ObjectChange>, String> {
        let call = &tx.call;
        if call.target.package != self.package_id || call.target.module != MODULE_NAME {
            return Err(format!("unknown function {}", call.target));
        }
        let sender = &tx.sender;
        let is_admin = state.owns_type(sender, &self.capability_type);

        match (call.target.function.as_str(), call.arguments.as_slice()) {
            ("add_to_whitelist", [CallArg::Object(wl), CallArg::Address(member)]) => {
                self.check_whitelist(wl)?;
                if !is_admin {
                    return Err("ENotAdmin".into());
                }
                if state.whitelist.contains(member) {
                    return Err("EAlreadyWhitelisted".into());
                }
                state.whitelist.push(member.clone());
                Ok(vec![ObjectChange::Mutated {
                    object_id: wl.clone(),
                }])
            }
            ("remove_from_whitelist", [CallArg::Object(wl), CallArg::Address(member)]) => {
                self.check_whitelist(wl)?;
                if !is_admin {
                    return Err("ENotAdmin".into());
                }
                let index = state
                    .whitelist
                    .iter()
                    .position(|a| a == member)
                    .ok_or("ENotWhitelisted")?;
                state.whitelist.remove(index);
                Ok(vec![ObjectChange::Mutated {
                    object_id: wl.clone(),
                }])
            }
            ("remove_nft", [CallArg::Object(id)]) => {
                let owned = state
                    .objects
                    .get(id)
                    .is_some_and(|o| &o.owner == sender && o.is_of_type(&self.asset_type));
                if !owned {
                    return Err(format!("object {id} is not an owned NFT"));
                }
                state.objects.remove(id);
                Ok(vec![ObjectChange::Deleted {
                    object_id: id.clone(),
                }])
            }
            ("paid_mint", [CallArg::String(name), CallArg::String(description), CallArg::String(image_url)]) => {
                let paid = tx.payment.map_or(0, |p| p.amount());
                if paid < self.mint_price {
                    return Err("EInsufficientPayment".into());
                }
                if let Some(balance) = state.balances.get_mut(sender) {
                    *balance = balance.saturating_sub(paid);
                }
                Ok(vec![self.create_asset(state, sender, name, description, image_url)])
            }
            ("mint_for_whitelisted", [CallArg::Object(wl), CallArg::String(name), CallArg::String(description), CallArg::String(image_url)]) => {
                self.check_whitelist(wl)?;
                if !state.whitelist.contains(sender) {
                    return Err("ENotWhitelisted".into());
                }
                Ok(vec![self.create_asset(state, sender, name, description, image_url)])
            }
            (function, _) => Err(format!("unexpected call to {function}")),
        }
    }

    fn check_whitelist(&self, id: &ObjectId) -> Result<(), String> {
        if id == &self.whitelist_id {
            Ok(())
        } else {
            Err(format!("object {id} is not the whitelist"))
        }
    }

    fn create_asset(
        &self,
        state: &mut ChainState,
        owner: &Address,
        name: &str,
        description: &str,
        image_url: &str,
    ) -> ObjectChange {
        let object_id = state.mint_object_id();
        state.objects.insert(
            object_id.clone(),
            StoredObject {
                owner: owner.clone(),
                type_tag: self.asset_type.clone(),
                fields: json!({
                    "name": name,
                    "description": description,
                    "image_url": image_url,
                }),
            },
        );
        ObjectChange::Created {
            object_id,
            object_type: self.asset_type.clone(),
        }
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn get_owned_objects(
        &self,
        owner: &Address,
        struct_type: Option<&str>,
    ) -> Result<Vec<OwnedObject>, LedgerError> {
        self.enter(LedgerOp::OwnedObjects, Some(owner)).await?;
        let state = self.state.lock();
        Ok(state
            .objects
            .iter()
            .filter(|(_, o)| &o.owner == owner)
            .filter(|(_, o)| struct_type.map_or(true, |t| o.is_of_type(t)))
            .map(|(id, o)| OwnedObject {
                object_id: id.clone(),
                type_tag: Some(o.type_tag.clone()),
                fields: o.fields.clone(),
            })
            .collect())
    }

    async fn get_dynamic_fields(&self, parent: &ObjectId) -> Result<Vec<DynamicField>, LedgerError> {
        self.enter(LedgerOp::DynamicFields, None).await?;
        if parent != &self.whitelist_id {
            return Ok(Vec::new());
        }
        Ok(self
            .state
            .lock()
            .whitelist
            .iter()
            .map(|a| DynamicField { key: a.to_string() })
            .collect())
    }

    async fn dev_inspect(
        &self,
        call: &MoveCall,
        sender: &Address,
    ) -> Result<InspectResults, LedgerError> {
        self.enter(LedgerOp::DevInspect, Some(sender)).await?;
        match (call.target.function.as_str(), call.arguments.as_slice()) {
            (MEMBERSHIP_FUNCTION, [CallArg::Object(wl), CallArg::Address(member)])
                if wl == &self.whitelist_id =>
            {
                let listed = self.state.lock().whitelist.contains(member);
                Ok(InspectResults::single(vec![u8::from(listed)], "bool"))
            }
            _ => Err(LedgerError::InvalidResponse(format!(
                "cannot inspect {}",
                call.target
            ))),
        }
    }

    async fn get_balance(&self, owner: &Address) -> Result<u64, LedgerError> {
        self.enter(LedgerOp::Balance, Some(owner)).await?;
        Ok(self.balance_of(owner))
    }

    async fn execute(
        &self,
        transaction: &TransactionRequest,
    ) -> Result<TransactionOutcome, LedgerError> {
        self.enter(LedgerOp::Execute, Some(&transaction.sender)).await?;

        let mut state = self.state.lock();
        let sender = &transaction.sender;
        let payment = transaction.payment.map_or(0, |p| p.amount());
        let available = state.balances.get(sender).copied().unwrap_or(0);
        if available < SIMULATED_GAS_FEE + payment {
            return Err(LedgerError::Rejected(format!(
                "insufficient gas: balance {available} MIST"
            )));
        }
        if let Some(budget) = transaction.gas_budget {
            if budget < SIMULATED_GAS_FEE {
                return Err(LedgerError::Rejected("gas budget too low".into()));
            }
        }

        state.executed.push(transaction.clone());
        let digest = state.digest();
        if let Some(balance) = state.balances.get_mut(sender) {
            *balance -= SIMULATED_GAS_FEE;
        }

        let result = match state.abort_next.take() {
            Some(reason) => Err(reason),
            None => self.apply_call(&mut state, transaction),
        };
        let (status, object_changes) = match result {
            Ok(changes) => (ExecutionStatus::Success, changes),
            Err(error) => (ExecutionStatus::Failure { error }, Vec::new()),
        };
        tracing::debug!(%digest, function = %transaction.call.target.function, ?status, "Simulated execution");

        Ok(TransactionOutcome {
            digest,
            status,
            object_changes,
            gas_used: SIMULATED_GAS_FEE,
        })
    }
}
