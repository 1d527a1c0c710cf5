//! 설정 관리 — drydock.toml 파싱 및 런타임 설정
//!
//! [`DrydockConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`DRYDOCK_SOURCE_SCOPE=all-layers` 형식)
//! 3. 설정 파일 (`drydock.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), drydock_core::error::DrydockError> {
//! use drydock_core::config::DrydockConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = DrydockConfig::load("drydock.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = DrydockConfig::parse("[source]\nscope = \"all-layers\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::DigestAlgorithm;
use crate::error::{ConfigError, DrydockError};
use crate::types::Scope;

/// Drydock 통합 설정
///
/// `drydock.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrydockConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 소스 해석 설정
    #[serde(default)]
    pub source: SourceConfig,
    /// 콘텐츠 cataloger 설정
    #[serde(default)]
    pub contents: ContentsConfig,
    /// 다이제스트 cataloger 설정
    #[serde(default)]
    pub digests: DigestsConfig,
    /// 업로드 설정
    #[serde(default)]
    pub upload: UploadConfig,
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 출력 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 소스 해석 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// 레이어드 소스의 스코프 (squashed, all-layers)
    pub scope: String,
    /// Docker daemon 소켓 경로
    pub docker_socket: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            scope: Scope::Squashed.to_string(),
            docker_socket: "/var/run/docker.sock".to_owned(),
        }
    }
}

/// 콘텐츠 cataloger 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 수집 대상 glob 패턴 목록
    pub globs: Vec<String>,
    /// 이 크기를 넘는 파일은 스킵 (바이트, 0이면 제한 없음)
    pub skip_files_above_size: u64,
}

impl Default for ContentsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            globs: Vec::new(),
            skip_files_above_size: 1024 * 1024, // 1 MB
        }
    }
}

/// 다이제스트 cataloger 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 대상 glob 패턴 목록
    pub globs: Vec<String>,
    /// 계산할 알고리즘 목록 (sha256, sha512)
    pub algorithms: Vec<String>,
}

impl Default for DigestsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            globs: vec!["**/*".to_owned()],
            algorithms: vec!["sha256".to_owned()],
        }
    }
}

/// 업로드 설정
///
/// 전송 클라이언트 자체는 이 워크스페이스 외부 협력자가 제공합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadConfig {
    /// 업로드 활성화 여부
    pub enabled: bool,
    /// 인벤토리 서비스 호스트
    pub host: String,
    /// 인증 사용자명
    pub username: String,
    /// 인증 비밀번호
    pub password: String,
    /// 함께 업로드할 Dockerfile 경로 (비어 있으면 미포함)
    pub dockerfile: String,
    /// 기존 업로드 덮어쓰기 여부
    pub overwrite_existing: bool,
}

impl DrydockConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DrydockError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DrydockError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DrydockError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                DrydockError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, DrydockError> {
        toml::from_str(toml_str).map_err(|e| {
            DrydockError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `DRYDOCK_{SECTION}_{FIELD}`
    /// 예: `DRYDOCK_SOURCE_SCOPE=all-layers`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "DRYDOCK_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "DRYDOCK_GENERAL_LOG_FORMAT");

        // Source
        override_string(&mut self.source.scope, "DRYDOCK_SOURCE_SCOPE");
        override_string(&mut self.source.docker_socket, "DRYDOCK_SOURCE_DOCKER_SOCKET");

        // Contents cataloger
        override_bool(&mut self.contents.enabled, "DRYDOCK_CONTENTS_ENABLED");
        override_csv(&mut self.contents.globs, "DRYDOCK_CONTENTS_GLOBS");
        override_u64(
            &mut self.contents.skip_files_above_size,
            "DRYDOCK_CONTENTS_SKIP_FILES_ABOVE_SIZE",
        );

        // Digests cataloger
        override_bool(&mut self.digests.enabled, "DRYDOCK_DIGESTS_ENABLED");
        override_csv(&mut self.digests.globs, "DRYDOCK_DIGESTS_GLOBS");
        override_csv(&mut self.digests.algorithms, "DRYDOCK_DIGESTS_ALGORITHMS");

        // Upload
        override_bool(&mut self.upload.enabled, "DRYDOCK_UPLOAD_ENABLED");
        override_string(&mut self.upload.host, "DRYDOCK_UPLOAD_HOST");
        override_string(&mut self.upload.username, "DRYDOCK_UPLOAD_USERNAME");
        override_string(&mut self.upload.password, "DRYDOCK_UPLOAD_PASSWORD");
        override_string(&mut self.upload.dockerfile, "DRYDOCK_UPLOAD_DOCKERFILE");
        override_bool(
            &mut self.upload.overwrite_existing,
            "DRYDOCK_UPLOAD_OVERWRITE_EXISTING",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DrydockError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // scope 검증 — 파이프라인 시작 전에 거부한다
        if Scope::from_str_loose(&self.source.scope).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "source.scope".to_owned(),
                reason: format!(
                    "must be one of: {}",
                    Scope::all()
                        .iter()
                        .map(|s| s.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            }
            .into());
        }

        // contents cataloger는 활성화 시 glob이 최소 하나 필요
        if self.contents.enabled && self.contents.globs.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "contents.globs".to_owned(),
                reason: "at least one glob pattern required when enabled".to_owned(),
            }
            .into());
        }

        // digests 알고리즘 검증
        if self.digests.enabled {
            if self.digests.algorithms.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "digests.algorithms".to_owned(),
                    reason: "at least one algorithm required when enabled".to_owned(),
                }
                .into());
            }
            for algorithm in &self.digests.algorithms {
                if DigestAlgorithm::from_str_loose(algorithm).is_none() {
                    return Err(ConfigError::InvalidValue {
                        field: "digests.algorithms".to_owned(),
                        reason: format!("unknown algorithm '{algorithm}'"),
                    }
                    .into());
                }
            }
        }

        // upload 검증
        if self.upload.enabled {
            if self.upload.host.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "upload.host".to_owned(),
                    reason: "host must not be empty when upload is enabled".to_owned(),
                }
                .into());
            }

            // Path traversal 체크: Path::components()로 ParentDir 컴포넌트 검출
            if !self.upload.dockerfile.is_empty()
                && Path::new(&self.upload.dockerfile)
                    .components()
                    .any(|c| c == std::path::Component::ParentDir)
            {
                return Err(ConfigError::InvalidValue {
                    field: "upload.dockerfile".to_owned(),
                    reason: "dockerfile path contains path traversal pattern '..'".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// 검증된 스코프 값을 반환합니다.
    pub fn scope_selection(&self) -> Result<Scope, ConfigError> {
        Scope::from_str_loose(&self.source.scope).ok_or_else(|| ConfigError::InvalidValue {
            field: "source.scope".to_owned(),
            reason: format!("unknown scope '{}'", self.source.scope),
        })
    }

    /// 검증된 다이제스트 알고리즘 목록을 반환합니다.
    pub fn digest_algorithms(&self) -> Result<Vec<DigestAlgorithm>, ConfigError> {
        self.digests
            .algorithms
            .iter()
            .map(|s| {
                DigestAlgorithm::from_str_loose(s).ok_or_else(|| ConfigError::InvalidValue {
                    field: "digests.algorithms".to_owned(),
                    reason: format!("unknown algorithm '{s}'"),
                })
            })
            .collect()
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, key: &str) {
    if let Ok(value) = std::env::var(key) {
        *target = value;
    }
}

fn override_bool(target: &mut bool, key: &str) {
    if let Ok(value) = std::env::var(key) {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => *target = true,
            "false" | "0" | "no" => *target = false,
            _ => tracing::warn!(key, value, "ignoring invalid boolean env override"),
        }
    }
}

fn override_u64(target: &mut u64, key: &str) {
    if let Ok(value) = std::env::var(key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(key, value, "ignoring invalid integer env override"),
        }
    }
}

fn override_csv(target: &mut Vec<String>, key: &str) {
    if let Ok(value) = std::env::var(key) {
        *target = value
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
