//! The standard tree a fresh session boots into.

use chrono::Utc;

use super::error::VfsResult;
use super::node::{Credentials, DeviceClass};
use super::tree::Vfs;

/// Kernel release string shared by `/proc/version` and `uname`.
pub const KERNEL_RELEASE: &str = "5.15.0-termsim";

/// Who the tree is being seeded for.
#[derive(Debug, Clone)]
pub struct SeedProfile<'a> {
    pub user: &'a str,
    pub home: &'a str,
    pub hostname: &'a str,
}

const DIRECTORIES: &[(&str, u32)] = &[
    ("/bin", 0o755),
    ("/sbin", 0o755),
    ("/boot", 0o755),
    ("/usr/bin", 0o755),
    ("/usr/sbin", 0o755),
    ("/usr/lib", 0o755),
    ("/usr/local/bin", 0o755),
    ("/usr/share/man", 0o755),
    ("/etc/skel", 0o755),
    ("/etc/default", 0o755),
    ("/etc/cron.d", 0o755),
    ("/var/log", 0o755),
    ("/var/tmp", 0o1777),
    ("/var/cache", 0o755),
    ("/var/lib", 0o755),
    ("/var/mail", 0o2775),
    ("/var/spool", 0o755),
    ("/home", 0o755),
    ("/root", 0o700),
    ("/tmp", 0o1777),
    ("/opt", 0o755),
    ("/srv", 0o755),
    ("/mnt", 0o755),
    ("/media", 0o755),
    ("/lib", 0o755),
    ("/lib64", 0o755),
    ("/dev", 0o755),
    ("/proc/sys/kernel", 0o555),
    ("/sys/class/net/eth0", 0o755),
    ("/sys/class/net/lo", 0o755),
    ("/sys/block/sda", 0o755),
    ("/run", 0o755),
];

const HOME_DIRECTORIES: &[&str] = &[
    "Documents",
    "Downloads",
    "Music",
    "Pictures",
    "Videos",
    ".config",
    ".local",
    ".cache",
];

const DEVICES: &[(&str, DeviceClass, u32, u32, u32)] = &[
    ("/dev/null", DeviceClass::Char, 1, 3, 0o666),
    ("/dev/zero", DeviceClass::Char, 1, 5, 0o666),
    ("/dev/full", DeviceClass::Char, 1, 7, 0o666),
    ("/dev/random", DeviceClass::Char, 1, 8, 0o666),
    ("/dev/urandom", DeviceClass::Char, 1, 9, 0o666),
    ("/dev/tty", DeviceClass::Char, 5, 0, 0o666),
    ("/dev/console", DeviceClass::Char, 5, 1, 0o600),
    ("/dev/ptmx", DeviceClass::Char, 5, 2, 0o666),
    ("/dev/tty0", DeviceClass::Char, 4, 0, 0o620),
    ("/dev/tty1", DeviceClass::Char, 4, 1, 0o620),
    ("/dev/sda", DeviceClass::Block, 8, 0, 0o660),
    ("/dev/sda1", DeviceClass::Block, 8, 1, 0o660),
    ("/dev/sda2", DeviceClass::Block, 8, 2, 0o660),
    ("/dev/loop0", DeviceClass::Block, 7, 0, 0o660),
    ("/dev/loop1", DeviceClass::Block, 7, 1, 0o660),
];

const SYMLINKS: &[(&str, &str)] = &[
    ("bash", "/bin/sh"),
    ("/proc/self/fd", "/dev/fd"),
    ("/run", "/var/run"),
];

/// Populate `vfs` with a small Linux-like tree. Everything is created as
/// root; the user's home is then handed to the user.
pub fn seed_standard_tree(vfs: &mut Vfs, profile: &SeedProfile<'_>) -> VfsResult<()> {
    let previous = vfs.credentials().clone();
    vfs.set_credentials(Credentials::root());

    for (path, mode) in DIRECTORIES {
        vfs.mkdir(path, true)?;
        vfs.chmod(path, *mode)?;
    }
    for (path, class, major, minor, mode) in DEVICES {
        vfs.create_device(path, *class, *major, *minor, *mode)?;
    }

    seed_etc(vfs, profile)?;
    seed_proc(vfs, profile)?;
    seed_sys(vfs)?;

    file(vfs, "/var/log/dmesg", &dmesg(), 0o644)?;
    for log in ["syslog", "auth.log", "kern.log"] {
        file(vfs, &format!("/var/log/{log}"), "", 0o640)?;
    }
    for command in ["bash", "ls", "cat", "grep", "sleep"] {
        file(vfs, &format!("/bin/{command}"), "", 0o755)?;
    }

    for (target, link) in SYMLINKS {
        vfs.symlink(target, link)?;
    }

    seed_home(vfs, profile)?;
    vfs.set_credentials(previous);
    Ok(())
}

fn file(vfs: &mut Vfs, path: &str, content: &str, mode: u32) -> VfsResult<()> {
    vfs.write(path, content.as_bytes(), false)?;
    vfs.chmod(path, mode)
}

fn seed_home(vfs: &mut Vfs, profile: &SeedProfile<'_>) -> VfsResult<()> {
    let home = profile.home;
    vfs.mkdir(home, true)?;
    file(vfs, &format!("{home}/.bashrc"), BASHRC, 0o644)?;
    file(vfs, &format!("{home}/.profile"), PROFILE, 0o644)?;
    file(vfs, &format!("{home}/.bash_logout"), "# ~/.bash_logout\nclear\n", 0o644)?;

    if profile.user == "root" {
        return Ok(());
    }

    vfs.chmod(home, 0o755)?;
    for dir in HOME_DIRECTORIES {
        vfs.mkdir(&format!("{home}/{dir}"), true)?;
    }

    // Hand the home tree to the user
    let mut pending = vec![home.to_string()];
    while let Some(path) = pending.pop() {
        vfs.chown(&path, Some(profile.user), Some(profile.user))?;
        if vfs.is_dir(&path) {
            for entry in vfs.list(&path)? {
                pending.push(format!("{path}/{}", entry.name));
            }
        }
    }
    Ok(())
}

fn seed_etc(vfs: &mut Vfs, profile: &SeedProfile<'_>) -> VfsResult<()> {
    let host = profile.hostname;
    let user = profile.user;

    let mut passwd = String::from(
        "root:x:0:0:root:/root:/bin/bash\n\
         daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin\n\
         bin:x:2:2:bin:/bin:/usr/sbin/nologin\n\
         sys:x:3:3:sys:/dev:/usr/sbin/nologin\n\
         www-data:x:33:33:www-data:/var/www:/usr/sbin/nologin\n\
         nobody:x:65534:65534:nobody:/nonexistent:/usr/sbin/nologin\n",
    );
    let mut group = String::from(
        "root:x:0:\ndaemon:x:1:\nbin:x:2:\nsys:x:3:\nadm:x:4:syslog\ntty:x:5:\n\
         sudo:x:27:\nstaff:x:50:\nusers:x:100:\nnogroup:x:65534:\n",
    );
    let mut shadow = String::from("root:*:19000:0:99999:7:::\ndaemon:*:19000:0:99999:7:::\n");
    if user != "root" {
        passwd.push_str(&format!("{user}:x:1000:1000:{user}:{}:/bin/bash\n", profile.home));
        group.push_str(&format!("{user}:x:1000:\n"));
        shadow.push_str(&format!("{user}:!:19000:0:99999:7:::\n"));
    }

    file(vfs, "/etc/passwd", &passwd, 0o644)?;
    file(vfs, "/etc/group", &group, 0o644)?;
    file(vfs, "/etc/shadow", &shadow, 0o640)?;
    file(vfs, "/etc/hostname", &format!("{host}\n"), 0o644)?;
    file(
        vfs,
        "/etc/hosts",
        &format!("127.0.0.1\tlocalhost\n127.0.1.1\t{host}\n"),
        0o644,
    )?;
    file(vfs, "/etc/resolv.conf", "nameserver 8.8.8.8\nnameserver 8.8.4.4\n", 0o644)?;
    file(vfs, "/etc/fstab", FSTAB, 0o644)?;
    file(vfs, "/etc/os-release", OS_RELEASE, 0o644)?;
    file(vfs, "/etc/issue", "Termsim 1.0 \\n \\l\n\n", 0o644)?;
    file(vfs, "/etc/motd", "\nWelcome to Termsim 1.0\n\n", 0o644)?;
    file(vfs, "/etc/shells", "/bin/sh\n/bin/bash\n/usr/bin/bash\n", 0o644)?;
    file(vfs, "/etc/profile", PROFILE, 0o644)?;
    file(
        vfs,
        "/etc/environment",
        "PATH=\"/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin\"\n",
        0o644,
    )?;
    file(vfs, "/etc/timezone", "UTC\n", 0o644)?;
    file(vfs, "/etc/skel/.bashrc", BASHRC, 0o644)
}

fn seed_proc(vfs: &mut Vfs, profile: &SeedProfile<'_>) -> VfsResult<()> {
    let now = Utc::now();
    file(
        vfs,
        "/proc/version",
        &format!(
            "Linux version {KERNEL_RELEASE} (gcc version 11.2.0) #1 SMP {}\n",
            now.format("%a %b %e %H:%M:%S UTC %Y")
        ),
        0o444,
    )?;
    file(vfs, "/proc/cpuinfo", &cpuinfo(4), 0o444)?;
    file(vfs, "/proc/meminfo", MEMINFO, 0o444)?;
    file(vfs, "/proc/uptime", "0.00 0.00\n", 0o444)?;
    file(vfs, "/proc/loadavg", "0.08 0.03 0.01 1/97 1\n", 0o444)?;
    file(
        vfs,
        "/proc/mounts",
        "/dev/sda1 / ext4 rw,relatime 0 0\nproc /proc proc rw,nosuid,nodev,noexec,relatime 0 0\n\
         sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0\ntmpfs /tmp tmpfs rw,nosuid,nodev 0 0\n",
        0o444,
    )?;
    file(vfs, "/proc/sys/kernel/hostname", &format!("{}\n", profile.hostname), 0o644)?;
    file(vfs, "/proc/sys/kernel/ostype", "Linux\n", 0o444)?;
    file(vfs, "/proc/sys/kernel/osrelease", &format!("{KERNEL_RELEASE}\n"), 0o444)?;
    vfs.mkdir("/proc/self/fd", true)?;
    Ok(())
}

fn seed_sys(vfs: &mut Vfs) -> VfsResult<()> {
    let interfaces = [
        ("eth0", "00:16:3e:00:00:01", "1500", "up"),
        ("lo", "00:00:00:00:00:00", "65536", "unknown"),
    ];
    for (iface, address, mtu, state) in interfaces {
        let base = format!("/sys/class/net/{iface}");
        file(vfs, &format!("{base}/address"), &format!("{address}\n"), 0o444)?;
        file(vfs, &format!("{base}/mtu"), &format!("{mtu}\n"), 0o444)?;
        file(vfs, &format!("{base}/operstate"), &format!("{state}\n"), 0o444)?;
    }
    file(vfs, "/sys/block/sda/size", "41943040\n", 0o444)
}

fn cpuinfo(cores: u32) -> String {
    (0..cores)
        .map(|i| {
            format!(
                "processor\t: {i}\nvendor_id\t: GenuineIntel\ncpu family\t: 6\nmodel\t\t: 158\n\
                 model name\t: Intel(R) Core(TM) i7-8700 CPU @ 3.20GHz\ncpu MHz\t\t: 3200.000\n\
                 cache size\t: 12288 KB\ncore id\t\t: {i}\ncpu cores\t: {cores}\n\
                 flags\t\t: fpu vme de pse tsc msr pae mce cx8 apic sep mtrr sse sse2 ht avx avx2\n\
                 bogomips\t: 6400.00\n\n"
            )
        })
        .collect()
}

fn dmesg() -> String {
    [
        "[    0.000000] Linux version 5.15.0-termsim (gcc version 11.2.0) #1 SMP",
        "[    0.000000] Command line: BOOT_IMAGE=/boot/vmlinuz root=/dev/sda1 ro quiet",
        "[    0.004000] Memory: 8388608K available",
        "[    0.120000] smpboot: Allowing 4 CPUs, 0 hotplug CPUs",
        "[    1.024000] EXT4-fs (sda1): mounted filesystem with ordered data mode",
        "[    1.512000] e1000: eth0 NIC Link is Up 1000 Mbps Full Duplex",
    ]
    .join("\n")
        + "\n"
}

const MEMINFO: &str = "MemTotal:        8388608 kB\nMemFree:         5242880 kB\n\
MemAvailable:    6291456 kB\nBuffers:          262144 kB\nCached:          1048576 kB\n\
SwapTotal:       2097148 kB\nSwapFree:        2097148 kB\n";

const FSTAB: &str = "# /etc/fstab: static file system information.\n\
# <file system> <mount point>   <type>  <options>       <dump>  <pass>\n\
/dev/sda1       /               ext4    errors=remount-ro 0       1\n\
/dev/sda2       none            swap    sw              0       0\n\
proc            /proc           proc    defaults        0       0\n";

const OS_RELEASE: &str = "NAME=\"Termsim\"\nVERSION=\"1.0\"\nID=termsim\nID_LIKE=debian\n\
PRETTY_NAME=\"Termsim 1.0\"\nVERSION_ID=\"1.0\"\n";

const PROFILE: &str = "if [ -n \"$BASH_VERSION\" ]; then\n    if [ -f \"$HOME/.bashrc\" ]; then\n        . \"$HOME/.bashrc\"\n    fi\nfi\n";

const BASHRC: &str = "# ~/.bashrc: executed by bash(1) for non-login shells.\n\
HISTSIZE=1000\n\
alias ll='ls -la'\n\
alias la='ls -A'\n\
alias l='ls -CF'\n";

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(user: &str, home: &str) -> Vfs {
        let mut vfs = Vfs::new();
        seed_standard_tree(
            &mut vfs,
            &SeedProfile {
                user,
                home,
                hostname: "box",
            },
        )
        .expect("seed");
        vfs
    }

    #[test]
    fn standard_layout() {
        let mut vfs = seeded("user", "/home/user");
        for dir in ["/etc", "/tmp", "/var/log", "/home/user/Documents", "/proc", "/sys/class/net"] {
            assert!(vfs.is_dir(dir), "{dir} should exist");
        }
        assert_eq!(vfs.stat("/tmp").unwrap().mode, 0o1777);
        assert_eq!(vfs.stat("/root").unwrap().mode, 0o700);
        assert_eq!(vfs.read_to_string("/etc/hostname").unwrap(), "box\n");
        assert!(vfs.read_to_string("/etc/passwd").unwrap().contains("user:x:1000"));
    }

    #[test]
    fn home_belongs_to_user() {
        let vfs = seeded("alice", "/home/alice");
        assert_eq!(vfs.stat("/home/alice").unwrap().owner, "alice");
        assert_eq!(vfs.stat("/home/alice/.bashrc").unwrap().owner, "alice");
        assert_eq!(vfs.stat("/etc/passwd").unwrap().owner, "root");
    }

    #[test]
    fn devices_and_links() {
        let vfs = seeded("root", "/root");
        let null = vfs.stat("/dev/null").unwrap();
        assert_eq!(null.device, Some((DeviceClass::Char, 1, 3)));
        assert_eq!(vfs.readlink("/bin/sh").unwrap(), "bash");
        assert!(vfs.is_file("/bin/sh"));
        assert!(!vfs.is_dir("/home/root"));
    }
}
