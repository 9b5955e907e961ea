//! Fop stub templates and the placeholder expander.
//!
//! Templates are C text with `@PLACEHOLDER@` tokens. Expansion is all or
//! nothing: a token with no substitution aborts with
//! [`GenError::MissingSubstitution`] rather than leaving it in the output.

use crate::catalog::OperationName;
use crate::error::GenError;
use crate::policy::{ErrorPolicy, FailureCondition};
use crate::signatures::SubstitutionTable;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Z][A-Z0-9_]*)@").expect("placeholder pattern compiles"));

/// Which side of the wind/unwind pair a template produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateRole {
    /// `dht2_<name>`: resolves the subvolume and winds the fop.
    ForwardCall,
    /// `dht2_<name>_cbk`: unwinds the result to the caller.
    Callback,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Definition,
    Declaration,
}

/// Subvolume class a forward call resolves against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RoutingLayout {
    #[default]
    Metadata,
    Data,
}

impl RoutingLayout {
    /// Layout selector passed to `dht2_find_subvol_for_gfid`.
    pub fn token(&self) -> &'static str {
        match self {
            RoutingLayout::Metadata => "DHT2_MDS_LAYOUT",
            RoutingLayout::Data => "DHT2_DS_LAYOUT",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub role: TemplateRole,
    pub body: BodyKind,
    pub text: &'static str,
}

pub const INODE_CBK_TEMPLATE: Template = Template {
    name: "inode-cbk",
    role: TemplateRole::Callback,
    body: BodyKind::Definition,
    text: r#"
int32_t
dht2_@NAME@_cbk (
        call_frame_t *frame, void *cookie, xlator_t *this,
        int32_t op_ret, int32_t op_errno,
        @LONG_ARGS@)
{
        VALIDATE_OR_GOTO (frame, bail);

        DHT2_STACK_UNWIND (@NAME@, frame, op_ret, op_errno,
                           @SHORT_ARGS@);
bail:
        return 0;
}
"#,
};

pub const INODE_FOP_TEMPLATE: Template = Template {
    name: "inode-fop",
    role: TemplateRole::ForwardCall,
    body: BodyKind::Definition,
    text: r#"
int32_t
dht2_@NAME@ (
        call_frame_t *frame, xlator_t *this,
        @LONG_ARGS@)
{
        dht2_conf_t     *conf = NULL;
        dht2_local_t    *local = NULL;
        int32_t          op_errno = @ERRNO_MISSING_INPUT@;
        xlator_t        *wind_subvol = NULL;

        VALIDATE_OR_GOTO (frame, bail);
        VALIDATE_OR_GOTO (this, err);
        VALIDATE_OR_GOTO (loc, err);
        VALIDATE_OR_GOTO (loc->inode, err);

        conf = this->private;
        if (!conf) {
                op_errno = @ERRNO_MISSING_CONFIG@;
                goto err;
        }

        local = dht2_local_init (frame, conf, loc, NULL, @FOP_ID@);
        if (!local) {
                op_errno = @ERRNO_ALLOCATION_FAILED@;
                goto err;
        }

        if (gf_uuid_is_null (loc->inode->gfid)) {
                op_errno = @ERRNO_MISSING_GFID@;
                gf_msg (DHT2_MSG_DOM, GF_LOG_ERROR, op_errno,
                        DHT2_MSG_MISSING_GFID_IN_INODE,
                        "Missing GFID for inode %p",
                        loc->inode);
                goto err;
        }

        /* determine subvolume to wind @NAME@ to */
        wind_subvol = dht2_find_subvol_for_gfid (conf, loc->inode->gfid,
                                                 @LAYOUT@);
        if (!wind_subvol) {
                op_errno = @ERRNO_RESOLUTION_FAILED@;
                gf_msg (DHT2_MSG_DOM, GF_LOG_ERROR, op_errno,
                        DHT2_MSG_FIND_SUBVOL_ERROR,
                        "Unable to find subvolume for GFID %s",
                        uuid_utoa (loc->inode->gfid));
                goto err;
        }

        /* wind @NAME@ to subvolume */
        STACK_WIND (frame, dht2_@NAME@_cbk,
                    wind_subvol, wind_subvol->fops->@NAME@,
                    @SHORT_ARGS@);

        return 0;
err:
        DHT2_STACK_UNWIND (@NAME@, frame, -1, op_errno,
                           @CBK_ERROR_ARGS@);
bail:
        return 0;
}
"#,
};

pub const FD_CBK_TEMPLATE: Template = Template {
    name: "fd-cbk",
    role: TemplateRole::Callback,
    body: BodyKind::Definition,
    text: r#"
int32_t
dht2_@NAME@_cbk (
        call_frame_t *frame, void *cookie, xlator_t *this,
        int32_t op_ret, int32_t op_errno,
        @LONG_ARGS@)
{
        VALIDATE_OR_GOTO (frame, bail);

        DHT2_STACK_UNWIND (@NAME@, frame, op_ret, op_errno,
                           @SHORT_ARGS@);
bail:
        return 0;
}
"#,
};

pub const FD_FOP_TEMPLATE: Template = Template {
    name: "fd-fop",
    role: TemplateRole::ForwardCall,
    body: BodyKind::Definition,
    text: r#"
int32_t
dht2_@NAME@ (
        call_frame_t *frame, xlator_t *this,
        @LONG_ARGS@)
{
        dht2_conf_t     *conf = NULL;
        dht2_local_t    *local = NULL;
        int32_t          op_errno = @ERRNO_MISSING_INPUT@;
        xlator_t        *wind_subvol = NULL;

        VALIDATE_OR_GOTO (frame, bail);
        VALIDATE_OR_GOTO (this, err);
        VALIDATE_OR_GOTO (fd, err);
        VALIDATE_OR_GOTO (fd->inode, err);

        conf = this->private;
        if (!conf) {
                op_errno = @ERRNO_MISSING_CONFIG@;
                goto err;
        }

        local = dht2_local_init (frame, conf, NULL, fd, @FOP_ID@);
        if (!local) {
                op_errno = @ERRNO_ALLOCATION_FAILED@;
                goto err;
        }

        if (gf_uuid_is_null (fd->inode->gfid)) {
                op_errno = @ERRNO_MISSING_GFID@;
                gf_msg (DHT2_MSG_DOM, GF_LOG_ERROR, op_errno,
                        DHT2_MSG_MISSING_GFID_IN_INODE,
                        "Missing GFID for inode %p",
                        fd->inode);
                goto err;
        }

        /* determine subvolume to wind @NAME@ to */
        wind_subvol = dht2_find_subvol_for_gfid (conf, fd->inode->gfid,
                                                 @LAYOUT@);
        if (!wind_subvol) {
                op_errno = @ERRNO_RESOLUTION_FAILED@;
                gf_msg (DHT2_MSG_DOM, GF_LOG_ERROR, op_errno,
                        DHT2_MSG_FIND_SUBVOL_ERROR,
                        "Unable to find subvolume for GFID %s",
                        uuid_utoa (fd->inode->gfid));
                goto err;
        }

        /* wind @NAME@ to subvolume */
        STACK_WIND (frame, dht2_@NAME@_cbk, wind_subvol,
                    wind_subvol->fops->@NAME@,
                    @SHORT_ARGS@);

        return 0;
err:
        DHT2_STACK_UNWIND (@NAME@, frame, -1, op_errno,
                           @CBK_ERROR_ARGS@);
bail:
        return 0;
}
"#,
};

pub const CBK_DECL_TEMPLATE: Template = Template {
    name: "cbk-decl",
    role: TemplateRole::Callback,
    body: BodyKind::Declaration,
    text: r#"
int32_t
dht2_@NAME@_cbk (
        call_frame_t *frame, void *cookie, xlator_t *this,
        int32_t op_ret, int32_t op_errno,
        @LONG_ARGS@);
"#,
};

pub const FOP_DECL_TEMPLATE: Template = Template {
    name: "fop-decl",
    role: TemplateRole::ForwardCall,
    body: BodyKind::Declaration,
    text: r#"
int32_t
dht2_@NAME@ (
        call_frame_t *frame, xlator_t *this,
        @LONG_ARGS@);
"#,
};

/// Expands templates against one substitution table and error policy.
pub struct Expander<'a> {
    table: &'a dyn SubstitutionTable,
    policy: &'a ErrorPolicy,
}

impl<'a> Expander<'a> {
    pub fn new(table: &'a dyn SubstitutionTable, policy: &'a ErrorPolicy) -> Self {
        Self { table, policy }
    }

    /// Fill every placeholder of `template` for `operation`.
    ///
    /// `layout` only matters for templates carrying `@LAYOUT@`; when omitted
    /// the metadata layout is used.
    pub fn expand(
        &self,
        template: &Template,
        operation: &OperationName,
        layout: Option<RoutingLayout>,
    ) -> Result<String, GenError> {
        let args = self.table.resolve(operation, template.role)?;
        let layout = layout.unwrap_or_default();

        let mut out = String::with_capacity(template.text.len() + 256);
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(template.text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value: Cow<'_, str> = match name.as_str() {
                "NAME" => Cow::Borrowed(operation.as_str()),
                "LONG_ARGS" => Cow::Borrowed(args.long.as_str()),
                "SHORT_ARGS" => Cow::Borrowed(args.short.as_str()),
                "CBK_ERROR_ARGS" => Cow::Borrowed(args.error.as_str()),
                "LAYOUT" => Cow::Borrowed(layout.token()),
                "FOP_ID" => Cow::Owned(fop_id(operation)),
                other => match FailureCondition::from_placeholder(other) {
                    Some(cond) => Cow::Borrowed(self.policy.code(cond)),
                    None => {
                        return Err(GenError::MissingSubstitution {
                            operation: operation.to_string(),
                            placeholder: other.to_string(),
                        });
                    }
                },
            };
            out.push_str(&template.text[last..whole.start()]);
            out.push_str(&value);
            last = whole.end();
        }
        out.push_str(&template.text[last..]);
        Ok(out)
    }
}

/// Expand with the default error policy.
pub fn expand(
    template: &Template,
    operation: &OperationName,
    table: &dyn SubstitutionTable,
    layout: Option<RoutingLayout>,
) -> Result<String, GenError> {
    let policy = ErrorPolicy::default();
    Expander::new(table, &policy).expand(template, operation, layout)
}

/// The `glusterfs_fop_t` enumerator for an operation, e.g. `GF_FOP_STAT`.
pub fn fop_id(operation: &OperationName) -> String {
    format!("GF_FOP_{}", operation.as_str().to_ascii_uppercase())
}

/// True if `text` still contains an `@PLACEHOLDER@` token.
pub fn has_placeholder(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signatures::ArgLists;

    struct OneOp;

    impl SubstitutionTable for OneOp {
        fn resolve(
            &self,
            operation: &OperationName,
            _role: TemplateRole,
        ) -> Result<ArgLists, GenError> {
            if operation.as_str() == "stat" {
                Ok(ArgLists::new("loc_t *loc", "loc", "NULL"))
            } else {
                Err(GenError::UnknownOperation {
                    operation: operation.to_string(),
                })
            }
        }
    }

    #[test]
    fn forward_call_embeds_name_args_and_routing_helper() {
        let text = expand(&INODE_FOP_TEMPLATE, &"stat".into(), &OneOp, None).unwrap();
        assert!(text.contains("dht2_stat ("));
        assert!(text.contains("loc_t *loc)"));
        assert!(text.contains("wind_subvol->fops->stat,\n                    loc);"));
        assert!(text.contains("dht2_find_subvol_for_gfid"));
        assert!(text.contains("DHT2_MDS_LAYOUT"));
        assert!(text.contains("GF_FOP_STAT"));
        assert!(!text.contains('@'));
    }

    #[test]
    fn data_layout_switches_routing_token() {
        let text = expand(
            &FD_FOP_TEMPLATE,
            &"stat".into(),
            &OneOp,
            Some(RoutingLayout::Data),
        )
        .unwrap();
        assert!(text.contains("DHT2_DS_LAYOUT"));
        assert!(!text.contains("DHT2_MDS_LAYOUT"));
    }

    #[test]
    fn policy_codes_land_in_unwind_paths() {
        let mut policy = ErrorPolicy::default();
        policy
            .set(FailureCondition::ResolutionFailed, "EREMOTE")
            .unwrap();
        let text = Expander::new(&OneOp, &policy)
            .expand(&INODE_FOP_TEMPLATE, &"stat".into(), None)
            .unwrap();
        assert!(text.contains("op_errno = EREMOTE;"));
        assert!(text.contains("op_errno = ENOMEM;"));
    }

    #[test]
    fn unknown_placeholder_aborts_expansion() {
        let broken = Template {
            name: "broken",
            role: TemplateRole::ForwardCall,
            body: BodyKind::Definition,
            text: "dht2_@NAME@ (@WRITEV_ARGS@);\n",
        };
        let err = expand(&broken, &"stat".into(), &OneOp, None).unwrap_err();
        assert_eq!(
            err,
            GenError::MissingSubstitution {
                operation: "stat".to_string(),
                placeholder: "WRITEV_ARGS".to_string(),
            }
        );
    }

    #[test]
    fn unknown_operation_propagates() {
        let err = expand(&CBK_DECL_TEMPLATE, &"flush".into(), &OneOp, None).unwrap_err();
        assert!(matches!(err, GenError::UnknownOperation { .. }));
    }

    #[test]
    fn declarations_have_no_body() {
        for template in [CBK_DECL_TEMPLATE, FOP_DECL_TEMPLATE] {
            let text = expand(&template, &"stat".into(), &OneOp, None).unwrap();
            assert!(!text.contains('{'), "{} emitted a body", template.name);
            assert!(text.trim_end().ends_with(");"));
        }
    }

    #[test]
    fn expansion_is_deterministic() {
        let first = expand(&FD_CBK_TEMPLATE, &"stat".into(), &OneOp, None).unwrap();
        let second = expand(&FD_CBK_TEMPLATE, &"stat".into(), &OneOp, None).unwrap();
        assert_eq!(first, second);
    }
}
