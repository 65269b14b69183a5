// ==========================================
// 项目作业分组核心 - 邀请码生成
// ==========================================
// 格式: SL- + 4 位符号，字母表 32 个字符，去掉易混淆的 0/O/1/I
// 唯一性由数据库 invite_code 唯一约束保证；本组件不重试，
// 冲突重试在插入小组时处理
// ==========================================

use rand::RngCore;

/// 邀请码前缀
pub const INVITE_CODE_PREFIX: &str = "SL-";

/// 邀请码符号位数
pub const INVITE_CODE_SYMBOLS: usize = 4;

/// 邀请码字母表
///
/// 前置条件: 字母表长度必须整除 256，否则 `byte % len` 会偏向前面的符号。
/// 当前长度 32 满足该条件，拒绝采样上限 `ACCEPT_BELOW` 等于 256，
/// 不会丢弃任何字节。修改字母表时拒绝采样仍然保证均匀，只是会丢弃部分字节。
pub const INVITE_CODE_ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

const ALPHABET_LEN: u16 = INVITE_CODE_ALPHABET.len() as u16;

// 字母表必须非空且不超过一个字节的取值范围
const _: () = assert!(ALPHABET_LEN > 0 && ALPHABET_LEN <= 256);

/// 小于该值的字节被接受: 256 - (256 % len)
const ACCEPT_BELOW: u16 = 256 - (256 % ALPHABET_LEN);

/// 邀请码来源
///
/// 创建小组时每次尝试调用一次 `next_code`
pub trait InviteCodeSource: Send + Sync {
    fn next_code(&self) -> String;
}

/// 邀请码生成器
#[derive(Debug, Default, Clone, Copy)]
pub struct InviteCodeIssuer;

impl InviteCodeIssuer {
    pub fn new() -> Self {
        Self
    }

    /// 使用线程本地 CSPRNG（由操作系统熵源播种）生成邀请码
    pub fn issue(&self) -> String {
        issue_with(&mut rand::rng())
    }

    /// 校验格式: SL- + 4 位字母表符号
    pub fn is_well_formed(code: &str) -> bool {
        match code.strip_prefix(INVITE_CODE_PREFIX) {
            Some(body) => {
                body.len() == INVITE_CODE_SYMBOLS
                    && body.bytes().all(|b| INVITE_CODE_ALPHABET.contains(&b))
            }
            None => false,
        }
    }

    /// 规范化用户输入（去空白、转大写）
    pub fn normalize(code: &str) -> String {
        code.trim().to_ascii_uppercase()
    }
}

impl InviteCodeSource for InviteCodeIssuer {
    fn next_code(&self) -> String {
        self.issue()
    }
}

/// 使用指定随机源生成邀请码（拒绝采样保证每个符号等概率）
pub fn issue_with<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut code = String::with_capacity(INVITE_CODE_PREFIX.len() + INVITE_CODE_SYMBOLS);
    code.push_str(INVITE_CODE_PREFIX);

    let mut produced = 0;
    let mut buf = [0u8; 8];
    while produced < INVITE_CODE_SYMBOLS {
        rng.fill_bytes(&mut buf);
        for &byte in buf.iter() {
            if u16::from(byte) >= ACCEPT_BELOW {
                continue;
            }
            let idx = (u16::from(byte) % ALPHABET_LEN) as usize;
            code.push(INVITE_CODE_ALPHABET[idx] as char);
            produced += 1;
            if produced == INVITE_CODE_SYMBOLS {
                break;
            }
        }
    }
    code
}
