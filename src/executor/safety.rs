//! Command safety analysis
//!
//! Allow-by-default, deny-by-pattern gate for shell commands suggested by
//! the model. This is explicitly not a sandbox: it only stops textually
//! recognizable destructive intent. Three rule families, checked in order:
//! single-word denylisted programs, multi-word denylisted prefixes (git
//! write subcommands), and structural patterns on the raw command string.

use lazy_static::lazy_static;
use regex::Regex;

/// Commands that are never allowed in read-only mode.
///
/// Multi-word entries match as a prefix of the whole normalized command;
/// single words match the first token exactly.
const DENYLIST: &[&str] = &[
    // Privilege escalation
    "sudo", "su", "doas",
    // File deletion
    "rm", "rmdir", "unlink", "shred",
    // File modification
    "mv", "cp", "dd", "truncate",
    // In-place editing
    "sed", "awk", "perl", "ed", "ex",
    // File creation/writing
    "touch", "mkdir", "mkfifo", "mknod", "tee",
    // Permission changes
    "chmod", "chown", "chgrp", "chattr",
    // Package management
    "apt", "apt-get", "yum", "dnf", "pacman", "brew", "npm", "pnpm", "yarn",
    "pip", "gem", "cargo",
    // System management
    "systemctl", "service", "init", "shutdown", "reboot", "poweroff", "halt",
    // Network modification
    "iptables", "ufw", "firewall-cmd",
    // User management
    "useradd", "userdel", "usermod", "passwd", "groupadd", "groupdel",
    // Disk operations
    "fdisk", "mkfs", "mount", "umount", "parted",
    // Process killing
    "kill", "killall", "pkill",
    // Git write operations
    "git push", "git commit", "git reset", "git checkout", "git merge",
    "git rebase", "git cherry-pick", "git revert",
    // Downloading/executing
    "curl", "wget", "exec", "eval", "source",
];

lazy_static! {
    /// Structural patterns checked against the original, unnormalized text.
    /// These catch a denylisted verb disguised as an argument or sub-shell.
    static ref DANGEROUS_PATTERNS: Vec<(Regex, &'static str)> = vec![
        (
            Regex::new(r"[|&;].*(?:rm|mv|dd|mkfs|shutdown|reboot)\b").unwrap(),
            "piping or chaining into a destructive command",
        ),
        (Regex::new(r">").unwrap(), "output redirection"),
        (Regex::new(r"\$\(.*\)").unwrap(), "command substitution"),
        (Regex::new(r"`.*`").unwrap(), "backtick command substitution"),
        (Regex::new(r"\bxargs\b").unwrap(), "xargs command fan-out"),
        (Regex::new(r":\s*>").unwrap(), "file truncation"),
        (Regex::new(r"\bchmod\b").unwrap(), "permission change"),
        (Regex::new(r"\bchown\b").unwrap(), "ownership change"),
    ];
}

/// Verdict for one command string
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub safe: bool,
    pub reason: Option<String>,
}

impl Verdict {
    fn safe() -> Self {
        Verdict {
            safe: true,
            reason: None,
        }
    }

    fn unsafe_because(reason: String) -> Self {
        Verdict {
            safe: false,
            reason: Some(reason),
        }
    }

    /// The rejection reason, or "Safe" when none
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or("Safe")
    }
}

/// Classify a command string as safe or unsafe.
///
/// Pure function of the string: no filesystem or environment inspection,
/// no caching. Returns on the first matched rule. An empty or
/// whitespace-only command matches no rule and is accepted; the executor
/// rejects it separately as a no-op.
pub fn validate(command: &str) -> Verdict {
    let normalized = command.trim().to_lowercase();
    let first_word = normalized.split_whitespace().next().unwrap_or("");

    for dangerous in DENYLIST {
        if dangerous.contains(' ') {
            if normalized.starts_with(dangerous) {
                return Verdict::unsafe_because(format!(
                    "Command '{}' is not allowed in read-only mode",
                    dangerous
                ));
            }
        } else if first_word == *dangerous {
            return Verdict::unsafe_because(format!(
                "Command '{}' is not allowed in read-only mode",
                dangerous
            ));
        }
    }

    // Structural checks run on the raw text so casing and spacing games
    // around the first token cannot hide a pattern.
    for (pattern, description) in DANGEROUS_PATTERNS.iter() {
        if pattern.is_match(command) {
            return Verdict::unsafe_because(format!(
                "Command contains dangerous pattern: {}",
                description
            ));
        }
    }

    Verdict::safe()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_commands_are_safe() {
        for cmd in [
            "ls -la",
            "cat file.txt",
            "grep -r pattern src/",
            "git status",
            "git log --oneline",
            "ps aux",
            "df -h",
            "echo hello",
        ] {
            let verdict = validate(cmd);
            assert!(verdict.safe, "expected '{}' to be safe", cmd);
            assert!(verdict.reason.is_none());
        }
    }

    #[test]
    fn denylisted_first_token_is_unsafe_regardless_of_arguments() {
        for cmd in ["rm -rf /", "rm", "sudo ls", "mv a b", "kill -9 1234", "curl http://x"] {
            assert!(!validate(cmd).safe, "expected '{}' to be unsafe", cmd);
        }
    }

    #[test]
    fn denylist_match_is_case_insensitive() {
        assert!(!validate("RM -rf /tmp/x").safe);
        assert!(!validate("Sudo whoami").safe);
        assert!(!validate("GIT COMMIT -m x").safe);
    }

    #[test]
    fn rm_reason_names_the_command() {
        let verdict = validate("rm -rf /");
        assert!(!verdict.safe);
        assert!(verdict.reason().contains("'rm'"));
    }

    #[test]
    fn git_write_subcommands_are_unsafe_by_prefix() {
        for cmd in [
            "git push origin main",
            "git commit -m x",
            "git reset --hard",
            "git checkout -b branch",
            "git merge other",
            "git rebase main",
            "git cherry-pick abc123",
            "git revert HEAD",
        ] {
            assert!(!validate(cmd).safe, "expected '{}' to be unsafe", cmd);
        }
        // git itself is not denylisted
        assert!(validate("git diff").safe);
    }

    #[test]
    fn redirection_is_unsafe_even_with_allowed_program() {
        assert!(!validate("echo hi > file.txt").safe);
        assert!(!validate("cat file.txt > out.txt").safe);
        assert!(!validate("ls >> log.txt").safe);
    }

    #[test]
    fn command_substitution_is_unsafe() {
        assert!(!validate("echo $(whoami)").safe);
        assert!(!validate("echo `whoami`").safe);
    }

    #[test]
    fn piping_into_destructive_command_is_unsafe() {
        assert!(!validate("ls | xargs rm").safe);
        assert!(!validate("echo yes; rm -rf /tmp/x").safe);
        assert!(!validate("true && mv a b").safe);
    }

    #[test]
    fn embedded_permission_changes_are_unsafe() {
        assert!(!validate("find . -exec chmod 777 {} +").safe);
        assert!(!validate("echo chown root file").safe);
    }

    #[test]
    fn xargs_is_unsafe_anywhere() {
        assert!(!validate("find . -name '*.rs' | xargs wc -l").safe);
    }

    #[test]
    fn truncate_idiom_is_unsafe() {
        assert!(!validate(": > file.txt").safe);
    }

    #[test]
    fn empty_command_falls_through_to_safe() {
        assert!(validate("").safe);
        assert!(validate("   ").safe);
    }

    #[test]
    fn validate_is_deterministic() {
        let a = validate("git commit -m x");
        let b = validate("git commit -m x");
        assert_eq!(a, b);
        let c = validate("ls -la");
        let d = validate("ls -la");
        assert_eq!(c, d);
    }

    #[test]
    fn first_matched_rule_wins() {
        // Denylisted first token and a redirection: the denylist reason is
        // reported because token checks run before pattern checks.
        let verdict = validate("rm -rf / > /dev/null");
        assert!(verdict.reason().contains("'rm'"));
    }
}
