//! Typed wrappers around `op` subcommands.
//!
//! Every call runs exactly one `op` process. JSON output is parsed through
//! the `opw-items` registry using the validation settings in
//! [`OpCliConfig`].

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use opw_items::{
    AccountList, AccountRecord, Group, GroupList, Item, ItemCategory, ItemList, ItemRegistry,
    NewItem, TemplateMap, User, UserList, Vault, VaultList,
};
use serde_json::Value;

use super::runner::{CommandRunner, ProcessRunner, RawOutput};
use super::types::*;

pub struct OpCli {
    config: OpCliConfig,
    registry: ItemRegistry,
    runner: Arc<dyn CommandRunner>,
}

impl OpCli {
    pub fn new(config: OpCliConfig) -> Self {
        Self::with_runner(config, Arc::new(ProcessRunner))
    }

    pub fn with_runner(config: OpCliConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            registry: ItemRegistry::new(),
            runner,
        }
    }

    /// Replace the item registry, e.g. one extended with custom categories.
    pub fn with_registry(mut self, registry: ItemRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &OpCliConfig {
        &self.config
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    pub fn set_session_token(&mut self, token: Option<String>) {
        self.config.session_token = token;
    }

    // ─── Invocation ──────────────────────────────────────────────────

    fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(account) = &self.config.account {
            args.push("--account".to_string());
            args.push(account.clone());
        }
        args
    }

    /// Environment carrying the session token, which never goes on argv.
    fn session_env(&self) -> Result<Vec<(String, String)>, OpCliError> {
        let token = match &self.config.session_token {
            Some(token) => token,
            None => return Ok(Vec::new()),
        };
        let account = self.config.account.as_deref().ok_or_else(|| {
            OpCliError::not_signed_in("A session token needs an account to name OP_SESSION_<account>")
        })?;
        Ok(vec![(session_var(account), token.clone())])
    }

    /// Run `op` with `args` and return stdout, raising on non-zero exit.
    async fn run(&self, args: Vec<String>) -> Result<String, OpCliError> {
        debug!("Running op command: op {}", args.join(" "));
        let env = self.session_env()?;
        let mut full_args = self.global_args();
        full_args.extend(args);

        let timeout = Duration::from_secs(self.config.timeout_secs);
        let output = self
            .runner
            .run(&self.config.op_path, &full_args, &env, timeout)
            .await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(classify_failure(output))
        }
    }

    fn vault_args(args: &mut Vec<String>, vault: Option<&str>) {
        if let Some(vault) = vault {
            args.push("--vault".to_string());
            args.push(vault.to_string());
        }
    }

    // ─── General ─────────────────────────────────────────────────────

    pub async fn version(&self) -> Result<String, OpCliError> {
        let out = self.run(vec!["--version".to_string()]).await?;
        Ok(out.trim().to_string())
    }

    /// Resolve an `op://vault/item/field` secret reference.
    pub async fn read(&self, reference: &str) -> Result<String, OpCliError> {
        self.run(vec![
            "read".to_string(),
            reference.to_string(),
            "--no-newline".to_string(),
        ])
        .await
    }

    // ─── Items ───────────────────────────────────────────────────────

    pub async fn item_list(
        &self,
        vault: Option<&str>,
        categories: &[ItemCategory],
        include_archive: bool,
    ) -> Result<ItemList, OpCliError> {
        let mut args = vec![
            "item".to_string(),
            "list".to_string(),
            "--format".to_string(),
            "json".to_string(),
        ];
        Self::vault_args(&mut args, vault);
        if !categories.is_empty() {
            let labels: Vec<&str> = categories.iter().map(|c| c.label()).collect();
            args.push("--categories".to_string());
            args.push(labels.join(","));
        }
        if include_archive {
            args.push("--include-archive".to_string());
        }
        let out = self.run(args).await?;
        let text = if out.trim().is_empty() { "[]" } else { out.as_str() };
        let list = ItemList::from_json(text, &self.registry, self.config.generic_okay)?;
        debug!("op item list returned {} items", list.len());
        Ok(list)
    }

    pub async fn item_get(&self, item: &str, vault: Option<&str>) -> Result<Item, OpCliError> {
        let mut args = vec![
            "item".to_string(),
            "get".to_string(),
            item.to_string(),
            "--format".to_string(),
            "json".to_string(),
        ];
        Self::vault_args(&mut args, vault);
        let out = self.run(args).await?;
        Ok(self.registry.item_from_json(&out, self.config.parse_options())?)
    }

    /// Template record for a category, as `op item template get` prints it.
    pub async fn item_template(&self, category: &ItemCategory) -> Result<Value, OpCliError> {
        let out = self
            .run(vec![
                "item".to_string(),
                "template".to_string(),
                "get".to_string(),
                category.label().to_string(),
                "--format".to_string(),
                "json".to_string(),
            ])
            .await?;
        serde_json::from_str(&out)
            .map_err(|e| OpCliError::parse(format!("Failed to parse template JSON: {}", e)))
    }

    /// Fetch templates for several categories into a map usable by
    /// [`NewItem::build`].
    pub async fn template_map(&self, categories: &[ItemCategory]) -> Result<TemplateMap, OpCliError> {
        let mut map = TemplateMap::new();
        for category in categories {
            let template = self.item_template(category).await?;
            map.insert(category.clone(), template);
        }
        Ok(map)
    }

    /// Create an item from `new_item`. The scratch template file is removed
    /// whether or not `op` succeeds.
    pub async fn item_create(
        &self,
        new_item: &mut NewItem,
        vault: Option<&str>,
    ) -> Result<Item, OpCliError> {
        let path = new_item.write_template_file()?;
        let mut args = vec![
            "item".to_string(),
            "create".to_string(),
            "--template".to_string(),
            path.to_string_lossy().to_string(),
            "--format".to_string(),
            "json".to_string(),
        ];
        Self::vault_args(&mut args, vault);

        let result = self.run(args).await;
        let closed = new_item.close();
        let out = result?;
        if let Err(e) = closed {
            warn!("op item create succeeded but scratch cleanup failed: {}", e);
        }
        let item = self.registry.item_from_json(&out, self.config.parse_options())?;
        info!("created item '{}' ({})", item.title(), item.unique_id());
        Ok(item)
    }

    pub async fn item_delete(
        &self,
        item: &str,
        vault: Option<&str>,
        archive: bool,
    ) -> Result<(), OpCliError> {
        let mut args = vec!["item".to_string(), "delete".to_string(), item.to_string()];
        Self::vault_args(&mut args, vault);
        if archive {
            args.push("--archive".to_string());
        }
        self.run(args).await?;
        info!("deleted item '{}'{}", item, if archive { " (archived)" } else { "" });
        Ok(())
    }

    // ─── Vaults, users, groups ───────────────────────────────────────

    async fn account_get<T: AccountRecord>(&self, noun: &str, id: &str) -> Result<T, OpCliError> {
        let out = self
            .run(vec![
                noun.to_string(),
                "get".to_string(),
                id.to_string(),
                "--format".to_string(),
                "json".to_string(),
            ])
            .await?;
        Ok(T::from_json(&out)?)
    }

    async fn account_list<T: AccountRecord>(
        &self,
        noun: &str,
        extra: &[(&str, &str)],
    ) -> Result<AccountList<T>, OpCliError> {
        let mut args = vec![
            noun.to_string(),
            "list".to_string(),
            "--format".to_string(),
            "json".to_string(),
        ];
        for (flag, value) in extra {
            args.push(flag.to_string());
            args.push(value.to_string());
        }
        let out = self.run(args).await?;
        let text = if out.trim().is_empty() { "[]" } else { out.as_str() };
        Ok(AccountList::from_json(text)?)
    }

    pub async fn vault_get(&self, vault: &str) -> Result<Vault, OpCliError> {
        self.account_get("vault", vault).await
    }

    pub async fn vault_list(&self) -> Result<VaultList, OpCliError> {
        self.account_list("vault", &[]).await
    }

    pub async fn user_get(&self, user: &str) -> Result<User, OpCliError> {
        self.account_get("user", user).await
    }

    /// Users, optionally restricted to a group or vault.
    pub async fn user_list(
        &self,
        group: Option<&str>,
        vault: Option<&str>,
    ) -> Result<UserList, OpCliError> {
        let mut extra = Vec::new();
        if let Some(group) = group {
            extra.push(("--group", group));
        }
        if let Some(vault) = vault {
            extra.push(("--vault", vault));
        }
        self.account_list("user", &extra).await
    }

    pub async fn group_get(&self, group: &str) -> Result<Group, OpCliError> {
        self.account_get("group", group).await
    }

    pub async fn group_list(&self, vault: Option<&str>) -> Result<GroupList, OpCliError> {
        match vault {
            Some(vault) => self.account_list("group", &[("--vault", vault)]).await,
            None => self.account_list("group", &[]).await,
        }
    }
}

/// `OP_SESSION_<account>`, with characters not allowed in a variable
/// name replaced by `_`.
fn session_var(account: &str) -> String {
    let name: String = account
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("OP_SESSION_{}", name)
}

/// Map a non-zero exit to an error kind using `op`'s stderr wording.
fn classify_failure(output: RawOutput) -> OpCliError {
    let code = output.exit_code;
    let msg = if output.stderr.trim().is_empty() {
        output.stdout.trim().to_string()
    } else {
        output.stderr.trim().to_string()
    };
    debug!("op exited with code {}: {}", code, msg);
    let lower = msg.to_lowercase();
    let err = if lower.contains("not currently signed in")
        || lower.contains("no accounts configured")
        || lower.contains("session expired")
        || lower.contains("authorization prompt dismissed")
    {
        OpCliError::not_signed_in(msg)
    } else if lower.contains("isn't an item")
        || lower.contains("isn't a vault")
        || lower.contains("isn't a user")
        || lower.contains("isn't a group")
        || lower.contains("could not find")
    {
        OpCliError::not_found(msg)
    } else {
        return OpCliError::command_failed(code, format!("op command failed: {}", msg));
    };
    err.with_exit_code(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use opw_items::{NewLoginItem, TemplateMap};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Replays canned outputs and records every invocation.
    #[derive(Default)]
    struct MockRunner {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        envs: Mutex<Vec<Vec<(String, String)>>>,
        responses: Mutex<VecDeque<RawOutput>>,
        template_seen: Mutex<Option<String>>,
    }

    impl MockRunner {
        fn with(responses: Vec<RawOutput>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            })
        }

        fn calls(&self) -> Vec<(String, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for MockRunner {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            env: &[(String, String)],
            _timeout: Duration,
        ) -> Result<RawOutput, OpCliError> {
            self.envs.lock().unwrap().push(env.to_vec());
            if let Some(pos) = args.iter().position(|a| a == "--template") {
                let path = PathBuf::from(&args[pos + 1]);
                *self.template_seen.lock().unwrap() = std::fs::read_to_string(path).ok();
            }
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec()));
            Ok(self.responses.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    fn ok(stdout: impl Into<String>) -> RawOutput {
        RawOutput {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    fn failed(stderr: &str, exit_code: i32) -> RawOutput {
        RawOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }

    fn login_json() -> String {
        json!({
            "id": "nok7367v4vbsfgg2fczwu4ei44",
            "title": "Example Login",
            "category": "LOGIN",
            "vault": { "id": "yhdg6ovhkjcfhn3u25cp2bnl6e", "name": "Test Data" },
            "fields": [
                { "id": "username", "type": "STRING", "purpose": "USERNAME", "label": "username", "value": "alice" },
                { "id": "password", "type": "CONCEALED", "purpose": "PASSWORD", "label": "password", "value": "hunter2" }
            ]
        })
        .to_string()
    }

    #[tokio::test]
    async fn global_flags_precede_subcommand() {
        let runner = MockRunner::with(vec![ok("2.30.0\n")]);
        let config = OpCliConfig {
            op_path: "/usr/local/bin/op".into(),
            account: Some("my".into()),
            session_token: Some("tok".into()),
            ..Default::default()
        };
        let cli = OpCli::with_runner(config, runner.clone());
        assert_eq!(cli.version().await.unwrap(), "2.30.0");
        let calls = runner.calls();
        assert_eq!(calls[0].0, "/usr/local/bin/op");
        assert_eq!(calls[0].1, ["--account", "my", "--version"]);
    }

    #[tokio::test]
    async fn session_token_goes_through_environment() {
        let runner = MockRunner::with(vec![ok("2.30.0\n")]);
        let config = OpCliConfig {
            account: Some("my-team.1password.com".into()),
            session_token: Some("tok".into()),
            ..Default::default()
        };
        let cli = OpCli::with_runner(config, runner.clone());
        cli.version().await.unwrap();
        assert!(!runner.calls()[0].1.iter().any(|a| a == "tok" || a == "--session"));
        assert_eq!(
            runner.envs.lock().unwrap()[0],
            [("OP_SESSION_my_team_1password_com".to_string(), "tok".to_string())]
        );
    }

    #[tokio::test]
    async fn session_token_without_account_is_refused() {
        let runner = MockRunner::with(vec![ok("2.30.0\n")]);
        let config = OpCliConfig {
            session_token: Some("tok".into()),
            ..Default::default()
        };
        let cli = OpCli::with_runner(config, runner.clone());
        let err = cli.version().await.unwrap_err();
        assert_eq!(err.kind, OpCliErrorKind::NotSignedIn);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn item_get_parses_typed_item() {
        let runner = MockRunner::with(vec![ok(login_json())]);
        let cli = OpCli::with_runner(OpCliConfig::default(), runner.clone());
        let item = cli.item_get("Example Login", Some("Test Data")).await.unwrap();
        match &item {
            Item::Login(login) => {
                use opw_items::Credential;
                assert_eq!(login.username().unwrap(), Some("alice"));
            }
            other => panic!("expected login, got {:?}", other),
        }
        assert_eq!(
            runner.calls()[0].1,
            ["item", "get", "Example Login", "--format", "json", "--vault", "Test Data"]
        );
    }

    #[tokio::test]
    async fn item_list_builds_flags_and_sorts() {
        let out = json!([
            { "id": "b", "title": "Zed", "category": "LOGIN" },
            { "id": "a", "title": "Abe", "category": "API_CREDENTIAL" }
        ])
        .to_string();
        let runner = MockRunner::with(vec![ok(out)]);
        let cli = OpCli::with_runner(OpCliConfig::default(), runner.clone());
        let list = cli
            .item_list(None, &[ItemCategory::Login, ItemCategory::ApiCredential], true)
            .await
            .unwrap();
        assert_eq!(list[0].title(), "Abe");
        assert_eq!(
            runner.calls()[0].1,
            [
                "item",
                "list",
                "--format",
                "json",
                "--categories",
                "Login,API Credential",
                "--include-archive"
            ]
        );
    }

    #[tokio::test]
    async fn empty_list_output_is_empty_list() {
        let runner = MockRunner::with(vec![ok("")]);
        let cli = OpCli::with_runner(OpCliConfig::default(), runner);
        assert!(cli.item_list(None, &[], false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_category_honours_generic_okay() {
        let record = json!({ "id": "x", "title": "t", "category": "CRYPTO_WALLET" }).to_string();
        let strict = OpCli::with_runner(OpCliConfig::default(), MockRunner::with(vec![ok(record.clone())]));
        let err = strict.item_get("x", None).await.unwrap_err();
        assert_eq!(err.kind, OpCliErrorKind::Item);

        let config = OpCliConfig {
            generic_okay: true,
            ..Default::default()
        };
        let lenient = OpCli::with_runner(config, MockRunner::with(vec![ok(record)]));
        assert!(lenient.item_get("x", None).await.unwrap().is_generic());
    }

    #[tokio::test]
    async fn stderr_is_classified() {
        let runner = MockRunner::with(vec![
            failed("[ERROR] 2023/01/01 You are not currently signed in.", 1),
            failed("[ERROR] \"nope\" isn't an item in any vault.", 1),
            failed("[ERROR] something else", 2),
        ]);
        let cli = OpCli::with_runner(OpCliConfig::default(), runner);
        let err = cli.item_get("nope", None).await.unwrap_err();
        assert_eq!(err.kind, OpCliErrorKind::NotSignedIn);
        let err = cli.item_get("nope", None).await.unwrap_err();
        assert_eq!(err.kind, OpCliErrorKind::NotFound);
        let err = cli.item_get("nope", None).await.unwrap_err();
        assert_eq!(err.kind, OpCliErrorKind::CommandFailed);
        assert_eq!(err.exit_code, Some(2));
    }

    #[tokio::test]
    async fn item_create_hands_over_template_and_cleans_up() {
        let runner = MockRunner::with(vec![ok(login_json())]);
        let cli = OpCli::with_runner(OpCliConfig::default(), runner.clone());
        let mut new_item = NewLoginItem::new("Example Login", "alice")
            .with_password("hunter2")
            .build(&TemplateMap::builtin())
            .unwrap();
        let created = cli.item_create(&mut new_item, Some("Test Data")).await.unwrap();
        assert_eq!(created.unique_id(), "nok7367v4vbsfgg2fczwu4ei44");

        let written = runner.template_seen.lock().unwrap().clone().unwrap();
        let written: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(written, new_item.to_value().unwrap());

        let args = &runner.calls()[0].1;
        let path = PathBuf::from(&args[3]);
        assert!(!path.exists());
        assert_eq!(&args[args.len() - 2..], ["--vault", "Test Data"]);
    }

    #[tokio::test]
    async fn item_create_cleans_up_on_failure() {
        let runner = MockRunner::with(vec![failed("[ERROR] invalid template", 1)]);
        let cli = OpCli::with_runner(OpCliConfig::default(), runner.clone());
        let mut new_item = NewLoginItem::new("x", "y").build(&TemplateMap::builtin()).unwrap();
        assert!(cli.item_create(&mut new_item, None).await.is_err());
        let path = PathBuf::from(&runner.calls()[0].1[3]);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn item_delete_args() {
        let runner = MockRunner::with(vec![ok("")]);
        let cli = OpCli::with_runner(OpCliConfig::default(), runner.clone());
        cli.item_delete("abc", Some("Private"), true).await.unwrap();
        assert_eq!(
            runner.calls()[0].1,
            ["item", "delete", "abc", "--vault", "Private", "--archive"]
        );
    }

    #[tokio::test]
    async fn template_map_collects_templates() {
        let template = json!({ "title": "", "category": "MEMBERSHIP", "fields": [] }).to_string();
        let runner = MockRunner::with(vec![ok(template)]);
        let cli = OpCli::with_runner(OpCliConfig::default(), runner.clone());
        let map = cli.template_map(&[ItemCategory::Membership]).await.unwrap();
        assert!(map.contains(&ItemCategory::Membership));
        assert_eq!(runner.calls()[0].1[3], "Membership");
    }

    #[tokio::test]
    async fn account_records() {
        let runner = MockRunner::with(vec![
            ok(json!([{ "id": "v2", "name": "Work" }, { "id": "v1", "name": "Private" }]).to_string()),
            ok(json!({ "id": "u1", "name": "Ada", "state": "ACTIVE" }).to_string()),
            ok(json!([{ "id": "g1", "name": "Owners" }]).to_string()),
        ]);
        let cli = OpCli::with_runner(OpCliConfig::default(), runner.clone());
        let vaults = cli.vault_list().await.unwrap();
        assert_eq!(vaults[0].name, "Private");
        let user = cli.user_get("u1").await.unwrap();
        assert!(user.is_active());
        let groups = cli.group_list(Some("Work")).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            runner.calls()[2].1,
            ["group", "list", "--format", "json", "--vault", "Work"]
        );
    }

    #[tokio::test]
    async fn read_passes_reference() {
        let runner = MockRunner::with(vec![ok("s3cret")]);
        let cli = OpCli::with_runner(OpCliConfig::default(), runner.clone());
        assert_eq!(cli.read("op://Private/Example/password").await.unwrap(), "s3cret");
        assert_eq!(
            runner.calls()[0].1,
            ["read", "op://Private/Example/password", "--no-newline"]
        );
    }
}
